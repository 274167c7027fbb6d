use super::Parser;
use crate::ast::{
    Declaration, EnumElement, EnumMemberElement, FieldElement, FunctionElement, Location, RawType,
    Requiredness, ServiceElement, StructElement, StructKind, TypedefElement,
};
use crate::error::ThriftError;
use std::collections::HashSet;

/// Append a trailing comment to leading documentation on a new line.
fn join_doc(doc: String, trailing: String) -> String {
    if trailing.is_empty() {
        doc
    } else if doc.is_empty() {
        trailing
    } else {
        format!("{}\n{}", doc, trailing)
    }
}

impl Parser {
    pub(super) fn parse_typedef(
        &mut self,
        location: Location,
        doc: String,
    ) -> Result<Declaration, ThriftError> {
        let old_type = self.read_type_name()?;
        let new_name = self.scanner.read_identifier(false)?;
        Ok(Declaration::Typedef(TypedefElement {
            location,
            documentation: doc,
            old_type,
            new_name,
        }))
    }

    // -- Enums ----------------------------------------------------

    pub(super) fn parse_enum(
        &mut self,
        location: Location,
        doc: String,
    ) -> Result<Declaration, ThriftError> {
        let name = self.scanner.read_identifier(false)?;
        self.scanner.expect_char(
            '{',
            &format!("expected an opening brace in enum definition for: {}", name),
        )?;

        // i64 so that an explicit i32::MAX does not overflow the counter
        let mut next_value: i64 = 0;
        let mut seen: HashSet<i32> = HashSet::new();
        let mut members = Vec::new();
        loop {
            let member_doc = self.scanner.read_documentation()?;
            if self.scanner.peek_char(true)? == '}' {
                self.scanner.bump();
                break;
            }

            let mut member = self.parse_enum_member(member_doc)?;
            let value = match member.explicit_value {
                Some(v) => {
                    next_value = next_value.max(i64::from(v) + 1);
                    v
                }
                None => {
                    let v = i32::try_from(next_value).map_err(|_| {
                        ThriftError::syntax(member.location.clone(), "enum value out of range")
                    })?;
                    next_value += 1;
                    v
                }
            };

            if !seen.insert(value) {
                return Err(ThriftError::syntax(
                    member.location,
                    format!("duplicate enum value: {}", value),
                ));
            }
            member.value = value;
            members.push(member);
        }

        Ok(Declaration::Enum(EnumElement {
            location,
            documentation: doc,
            name,
            members,
        }))
    }

    // enum member:
    //   identifier ('=' int)? separator? trailing-comment?
    fn parse_enum_member(&mut self, doc: String) -> Result<EnumMemberElement, ThriftError> {
        let location = self.scanner.location();
        let name = self.scanner.read_identifier(false)?;

        let mark = self.scanner.mark();
        let explicit_value = if self.scanner.peek_char(false)? == '=' {
            self.scanner.bump();
            Some(self.scanner.read_int()?)
        } else {
            self.scanner.reset(mark);
            None
        };

        let trailing = self.scanner.read_trailing_doc(true)?;
        Ok(EnumMemberElement {
            location,
            documentation: join_doc(doc, trailing),
            name,
            explicit_value,
            value: explicit_value.unwrap_or_default(),
        })
    }

    // -- Structs, unions, exceptions ------------------------------

    pub(super) fn parse_struct_like(
        &mut self,
        location: Location,
        doc: String,
        keyword: &str,
    ) -> Result<Declaration, ThriftError> {
        let kind = match keyword {
            "union" => StructKind::Union,
            "exception" => StructKind::Exception,
            _ => StructKind::Struct,
        };
        let name = self.scanner.read_identifier(false)?;
        self.scanner.expect_char(
            '{',
            &format!("expected an opening brace in {} definition for: {}", kind, name),
        )?;
        let fields = self.read_field_list('}')?;

        Ok(Declaration::Struct(StructElement {
            location,
            documentation: doc,
            kind,
            name,
            fields,
        }))
    }

    /// Shared by struct bodies, parameter lists and throws lists.
    ///
    /// Implicit ids count up from 1 and skip past any explicit id read so
    /// far; any repeated id is an error.
    fn read_field_list(&mut self, terminator: char) -> Result<Vec<FieldElement>, ThriftError> {
        let mut next_id: i64 = 1;
        let mut ids: HashSet<i32> = HashSet::new();
        let mut fields = Vec::new();
        loop {
            let field_doc = self.scanner.read_documentation()?;
            if self.scanner.peek_char(true)? == terminator {
                self.scanner.bump();
                break;
            }

            let mut field = self.read_field(field_doc)?;
            if field.explicit_id {
                if !ids.insert(field.id) {
                    return Err(ThriftError::syntax(
                        field.location,
                        format!("duplicate field ID: {}", field.id),
                    ));
                }
                if i64::from(field.id) >= next_id {
                    next_id = i64::from(field.id) + 1;
                }
            } else {
                let id = i32::try_from(next_id).map_err(|_| {
                    ThriftError::syntax(field.location.clone(), "field ID out of range")
                })?;
                next_id += 1;
                if !ids.insert(id) {
                    return Err(ThriftError::syntax(
                        field.location,
                        format!("duplicate field ID: {}", id),
                    ));
                }
                field.id = id;
            }
            fields.push(field);
        }
        Ok(fields)
    }

    fn read_field(&mut self, doc: String) -> Result<FieldElement, ThriftError> {
        let location = self.scanner.location();

        let mut id = None;
        let first = self.scanner.peek_char(true)?;
        if first.is_ascii_digit() || first == '-' || first == '+' {
            let field_id = self.scanner.read_int()?;
            if field_id < 1 {
                return Err(ThriftError::syntax(
                    location,
                    format!("field ID must be greater than zero, was: {}", field_id),
                ));
            }
            self.scanner.expect_char(':', "expected a ':' separator")?;
            id = Some(field_id);
        }

        let mut requiredness = Requiredness::Default;
        let mut type_name = self.read_type_name()?;
        if let RawType::Named(word) = &type_name {
            if word == "required" || word == "optional" {
                requiredness = if word == "required" {
                    Requiredness::Required
                } else {
                    Requiredness::Optional
                };
                type_name = self.read_type_name()?;
            }
        }

        let name = self.scanner.read_identifier(false)?;

        let mark = self.scanner.mark();
        if self.scanner.peek_char(false)? == '=' {
            return Err(self.err("const values are not yet implemented"));
        }
        self.scanner.reset(mark);

        let trailing = self.scanner.read_trailing_doc(true)?;
        Ok(FieldElement {
            location,
            documentation: join_doc(doc, trailing),
            id: id.unwrap_or_default(),
            explicit_id: id.is_some(),
            requiredness,
            type_name,
            name,
        })
    }

    // -- Services -------------------------------------------------

    pub(super) fn parse_service(
        &mut self,
        location: Location,
        doc: String,
    ) -> Result<Declaration, ThriftError> {
        let name = self.scanner.read_identifier(false)?;

        let mut extends = None;
        if self.scanner.peek_char(true)? == 'e' {
            let word = self.scanner.read_word()?;
            if word != "extends" {
                return Err(self.err(format!("unexpected token: {}", word)));
            }
            extends = Some(self.scanner.read_identifier(false)?);
        }

        self.scanner
            .expect_char('{', "expected an opening brace in service definition")?;

        let mut functions = Vec::new();
        loop {
            let function_doc = self.scanner.read_documentation()?;
            if self.scanner.peek_char(true)? == '}' {
                self.scanner.bump();
                break;
            }
            let function_location = self.scanner.location();
            functions.push(self.read_function(function_location, function_doc)?);
        }

        Ok(Declaration::Service(ServiceElement {
            location,
            documentation: doc,
            name,
            extends,
            functions,
        }))
    }

    fn read_function(
        &mut self,
        location: Location,
        doc: String,
    ) -> Result<FunctionElement, ThriftError> {
        let mut one_way = false;
        let mut return_type = self.read_type_name()?;
        if return_type == RawType::named("oneway") {
            one_way = true;
            return_type = self.read_type_name()?;
        }

        let name = self.scanner.read_identifier(false)?;
        self.scanner.expect_char('(', "invalid function definition")?;
        let params = self.read_field_list(')')?;

        let mut exceptions = Vec::new();
        let mark = self.scanner.mark();
        let mut is_throws = false;
        if self.scanner.peek_char(false)? == 't' {
            is_throws = self.scanner.read_word()? == "throws";
        }
        if is_throws {
            self.scanner.expect_char(
                '(',
                "expected a list of exception types after 'throws'",
            )?;
            exceptions = self.read_field_list(')')?;
        } else {
            self.scanner.reset(mark);
        }

        let trailing = self.scanner.read_trailing_doc(true)?;
        Ok(FunctionElement {
            location,
            documentation: join_doc(doc, trailing),
            one_way,
            return_type,
            name,
            params,
            exceptions,
        })
    }
}
