//! Namespace scopes recognised in `namespace <scope> <name>` statements.

use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum NamespaceScope {
    #[serde(rename = "*")]
    All,
    #[serde(rename = "cpp")]
    Cpp,
    #[serde(rename = "java")]
    Java,
    #[serde(rename = "py")]
    Py,
    #[serde(rename = "py.twisted")]
    PyTwisted,
    #[serde(rename = "perl")]
    Perl,
    #[serde(rename = "rb")]
    Rb,
    #[serde(rename = "cocoa")]
    Cocoa,
    #[serde(rename = "csharp")]
    Csharp,
    #[serde(rename = "php")]
    Php,
    #[serde(rename = "smalltalk.category")]
    SmalltalkCategory,
    #[serde(rename = "smalltalk.prefix")]
    SmalltalkPrefix,
    #[serde(rename = "js")]
    Js,
    #[serde(rename = "go")]
    Go,
    #[serde(rename = "c_glib")]
    CGlib,
    #[serde(rename = "delphi")]
    Delphi,
    #[serde(rename = "haxe")]
    Haxe,
    #[serde(rename = "netstd")]
    Netstd,
    #[serde(rename = "lua")]
    Lua,
    #[serde(rename = "rs")]
    Rs,
    #[serde(rename = "swift")]
    Swift,
}

const SCOPES: &[(&str, NamespaceScope)] = &[
    ("*", NamespaceScope::All),
    ("cpp", NamespaceScope::Cpp),
    ("java", NamespaceScope::Java),
    ("py", NamespaceScope::Py),
    ("py.twisted", NamespaceScope::PyTwisted),
    ("perl", NamespaceScope::Perl),
    ("rb", NamespaceScope::Rb),
    ("cocoa", NamespaceScope::Cocoa),
    ("csharp", NamespaceScope::Csharp),
    ("php", NamespaceScope::Php),
    ("smalltalk.category", NamespaceScope::SmalltalkCategory),
    ("smalltalk.prefix", NamespaceScope::SmalltalkPrefix),
    ("js", NamespaceScope::Js),
    ("go", NamespaceScope::Go),
    ("c_glib", NamespaceScope::CGlib),
    ("delphi", NamespaceScope::Delphi),
    ("haxe", NamespaceScope::Haxe),
    ("netstd", NamespaceScope::Netstd),
    ("lua", NamespaceScope::Lua),
    ("rs", NamespaceScope::Rs),
    ("swift", NamespaceScope::Swift),
];

impl NamespaceScope {
    /// Look up a scope by the spelling used in Thrift source.
    pub fn for_thrift_name(name: &str) -> Option<NamespaceScope> {
        SCOPES
            .iter()
            .find(|(spelling, _)| *spelling == name)
            .map(|(_, scope)| *scope)
    }

    pub fn thrift_name(self) -> &'static str {
        SCOPES
            .iter()
            .find(|(_, scope)| *scope == self)
            .map(|(spelling, _)| *spelling)
            .unwrap_or("*")
    }
}

impl fmt::Display for NamespaceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.thrift_name())
    }
}
