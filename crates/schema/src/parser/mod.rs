//! Recursive-descent parser for one `.thrift` file.
//! Every declaration carries its location and harvested documentation.
//! No symbol resolution is done here -- that is the linker's job.

use crate::ast::{Declaration, IncludeElement, Location, NamespaceElement, ThriftFile};
use crate::error::ThriftError;
use crate::namespace::NamespaceScope;
use crate::scanner::Scanner;

mod constructs;
mod types;

// ──────────────────────────────────────────────
// Parser
// ──────────────────────────────────────────────

struct Parser {
    scanner: Scanner,
    location: Location,
    reading_headers: bool,
    declaration_count: usize,
}

/// Parse a whole file. Fails on the first malformed construct; a tree is
/// never partially returned.
pub fn parse(location: Location, text: &str) -> Result<ThriftFile, ThriftError> {
    let mut p = Parser {
        scanner: Scanner::new(location.clone(), text),
        location,
        reading_headers: true,
        declaration_count: 0,
    };
    p.parse_file()
}

impl Parser {
    fn err(&self, msg: impl Into<String>) -> ThriftError {
        self.scanner.error(msg)
    }

    fn parse_file(&mut self) -> Result<ThriftFile, ThriftError> {
        let mut file = ThriftFile::new(self.location.clone());
        loop {
            let doc = self.scanner.read_documentation()?;
            if self.scanner.at_end() {
                break;
            }

            let decl = self.parse_declaration(doc)?;
            if decl.is_header() {
                if !self.reading_headers {
                    return Err(ThriftError::syntax(
                        decl.location().clone(),
                        "namespace and include statements must precede all other declarations",
                    ));
                }
            } else {
                self.reading_headers = false;
            }
            file.push(decl);
        }
        file.declaration_count = self.declaration_count;
        Ok(file)
    }

    fn parse_declaration(&mut self, doc: String) -> Result<Declaration, ThriftError> {
        let location = self.scanner.location();
        let word = self.scanner.read_word()?;
        match word.as_str() {
            "namespace" => self.parse_namespace(location),
            "php_namespace" => {
                let namespace = self.scanner.read_literal()?;
                Ok(Declaration::Namespace(NamespaceElement {
                    location,
                    scope: NamespaceScope::Php,
                    namespace,
                }))
            }
            "xsd_namespace" => Err(self.err("xsd_namespace is not supported")),
            "include" | "cpp_include" => {
                let path = self.scanner.read_literal()?;
                Ok(Declaration::Include(IncludeElement {
                    location,
                    path,
                    is_cpp: word == "cpp_include",
                }))
            }
            "const" => {
                self.declaration_count += 1;
                Err(self.err("const is not yet implemented"))
            }
            "typedef" => {
                self.declaration_count += 1;
                self.parse_typedef(location, doc)
            }
            "enum" => {
                self.declaration_count += 1;
                self.parse_enum(location, doc)
            }
            "senum" => Err(self.err("senum has been deprecated and is not supported")),
            "struct" | "union" | "exception" => {
                self.declaration_count += 1;
                self.parse_struct_like(location, doc, &word)
            }
            "service" => {
                self.declaration_count += 1;
                self.parse_service(location, doc)
            }
            other => Err(ThriftError::syntax(
                location,
                format!("unexpected element: {}", other),
            )),
        }
    }

    fn parse_namespace(&mut self, location: Location) -> Result<Declaration, ThriftError> {
        let scope_name = self.scanner.read_namespace_scope()?;
        let scope = NamespaceScope::for_thrift_name(&scope_name)
            .ok_or_else(|| self.err(format!("invalid namespace scope: {}", scope_name)))?;
        if scope == NamespaceScope::Php {
            return Err(self.err("scoped namespaces for PHP are not supported"));
        }

        let namespace = if scope == NamespaceScope::SmalltalkCategory {
            self.scanner.read_identifier(true)?
        } else {
            self.scanner.read_identifier(false)?
        };

        Ok(Declaration::Namespace(NamespaceElement {
            location,
            scope,
            namespace,
        }))
    }
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────
