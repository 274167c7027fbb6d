use super::Parser;
use crate::ast::RawType;
use crate::error::ThriftError;

impl Parser {
    // -- Type names ---------------------------------------------

    /// `list<T>`, `set<T>` and `map<K, V>` nest arbitrarily; any other word
    /// is taken as a type name and left for the linker to validate.
    pub(super) fn read_type_name(&mut self) -> Result<RawType, ThriftError> {
        let name = self.scanner.read_word()?;
        match name.as_str() {
            "list" | "set" => {
                self.scanner.expect_char('<', "missing type parameter")?;
                let param = self.read_type_name()?;
                self.scanner
                    .expect_char('>', "missing closing '>' in parameter list")?;
                if name == "list" {
                    Ok(RawType::List(Box::new(param)))
                } else {
                    Ok(RawType::Set(Box::new(param)))
                }
            }
            "map" => {
                self.scanner
                    .expect_char('<', "missing type parameter list")?;
                let key = self.read_type_name()?;
                self.scanner
                    .expect_char(',', "invalid map-type parameter list")?;
                let value = self.read_type_name()?;
                self.scanner
                    .expect_char('>', "missing closing '>' in parameter list")?;
                Ok(RawType::Map {
                    key: Box::new(key),
                    value: Box::new(value),
                })
            }
            _ => Ok(RawType::Named(name)),
        }
    }
}
