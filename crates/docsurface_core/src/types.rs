use serde::Serialize;

/// A module specifier extracted from one import/export/require site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Specifier {
    pub request: String,
    pub kind: SpecKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecKind {
    /// `import x from "..."`, `import "..."`, `import type {..} from "..."`
    Static,
    /// `export * from "..."`, `export { x } from "..."`
    ReExport,
    /// `import("...")`
    Dynamic,
    /// `require("...")`
    Require,
}
