use anyhow::{Context, Result};
use dashmap::DashMap;
use log::{debug, trace, warn};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{Visit, walk};
use oxc_parser::{Parser as OxcParser, ParserReturn};
use oxc_span::SourceType;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::types::{SpecKind, Specifier};

/// Returns every module specifier a file depends on, in source order.
///
/// Only the module syntax is inspected: static imports (type-only ones
/// included), re-exports, dynamic `import()` anywhere in the file and
/// `require()` calls with a literal argument.
pub fn imports_for(
    file: &Path,
    cache: &DashMap<PathBuf, Vec<Specifier>>,
) -> Result<Vec<Specifier>> {
    let file_buf = file.to_path_buf();
    if let Some(v) = cache.get(&file_buf) {
        trace!("Cache hit for imports: {}", file.display());
        return Ok(v.clone());
    }
    trace!("Parsing file for imports: {}", file.display());
    let src =
        fs::read_to_string(file).with_context(|| format!("Failed to read {}", file.display()))?;

    let specs = specifiers_in_source(file, &src);

    debug!("Found {} import specifiers in {}", specs.len(), file.display());
    cache.insert(file_buf, specs.clone());
    Ok(specs)
}

/// Parses `src` as the file at `path` and collects its specifiers.
pub fn specifiers_in_source(path: &Path, src: &str) -> Vec<Specifier> {
    let st = source_type_for(path);
    let allocator = Allocator::default();
    let ParserReturn { program, errors, panicked, .. } = OxcParser::new(&allocator, src, st).parse();
    if panicked {
        warn!("Parser gave up on {}, using partial AST", path.display());
    } else if !errors.is_empty() {
        trace!("{} syntax errors in {}", errors.len(), path.display());
    }

    let mut collector = SpecifierCollector::default();
    collector.visit_program(&program);
    collector.specs
}

#[derive(Default)]
struct SpecifierCollector {
    specs: Vec<Specifier>,
}

impl SpecifierCollector {
    fn push(&mut self, request: &str, kind: SpecKind) {
        trace!("Found {:?} specifier: '{}'", kind, request);
        self.specs.push(Specifier { request: request.to_string(), kind });
    }
}

impl<'a> Visit<'a> for SpecifierCollector {
    fn visit_import_declaration(&mut self, decl: &ImportDeclaration<'a>) {
        self.push(decl.source.value.as_str(), SpecKind::Static);
        walk::walk_import_declaration(self, decl);
    }

    fn visit_export_all_declaration(&mut self, decl: &ExportAllDeclaration<'a>) {
        self.push(decl.source.value.as_str(), SpecKind::ReExport);
        walk::walk_export_all_declaration(self, decl);
    }

    fn visit_export_named_declaration(&mut self, decl: &ExportNamedDeclaration<'a>) {
        if let Some(source) = &decl.source {
            self.push(source.value.as_str(), SpecKind::ReExport);
        }
        // `export function f() { return import("./x") }` still has edges inside.
        walk::walk_export_named_declaration(self, decl);
    }

    fn visit_import_expression(&mut self, expr: &ImportExpression<'a>) {
        if let Some(request) = literal_request(&expr.source) {
            self.push(request, SpecKind::Dynamic);
        } else {
            trace!("Skipping dynamic import with computed specifier");
        }
        walk::walk_import_expression(self, expr);
    }

    // `import x = require("./y")`
    fn visit_ts_import_equals_declaration(&mut self, decl: &TSImportEqualsDeclaration<'a>) {
        if let TSModuleReference::ExternalModuleReference(reference) = &decl.module_reference {
            self.push(reference.expression.value.as_str(), SpecKind::Require);
        }
        walk::walk_ts_import_equals_declaration(self, decl);
    }

    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Expression::Identifier(callee) = &call.callee
            && callee.name.as_str() == "require"
            && call.arguments.len() == 1
            && let Some(arg) = call.arguments[0].as_expression()
            && let Some(request) = literal_request(arg)
        {
            self.push(request, SpecKind::Require);
        }
        walk::walk_call_expression(self, call);
    }
}

/// A string literal, or a template literal without substitutions.
fn literal_request<'s>(expr: &'s Expression<'_>) -> Option<&'s str> {
    match expr {
        Expression::StringLiteral(sl) => Some(sl.value.as_str()),
        Expression::TemplateLiteral(tl) if tl.expressions.is_empty() && tl.quasis.len() == 1 => {
            tl.quasis[0].value.cooked.as_ref().map(|c| c.as_str())
        }
        _ => None,
    }
}

fn source_type_for(path: &Path) -> SourceType {
    let ext = path.extension().and_then(|e| e.to_str());

    let mut st = SourceType::default()
        .with_jsx(matches!(ext, Some("tsx") | Some("jsx") | Some("js")))
        .with_typescript(matches!(ext, Some("ts") | Some("tsx") | Some("mts") | Some("cts")));

    // Import/export syntax is what we are here for; parse everything as a module.
    st = st.with_module(true);

    st
}
