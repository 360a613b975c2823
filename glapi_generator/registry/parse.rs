////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use std::io;

use xml::reader::{EventReader, ParserConfig, XmlEvent};

use super::{Cmd, Enum, EnumGroup, Extension, Param, Proto, Reference, Registry, Require};
use crate::{Error, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
struct Attribute {
    key: String,
    value: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum ParseEvent {
    Start(String, Vec<Attribute>),
    End(String),
    Text(String),
}

fn get_attribute(attrs: &[Attribute], key: &str) -> Option<String> {
    attrs.iter().find(|a| a.key == key).map(|a| a.value.clone())
}

fn require_attribute(attrs: &[Attribute], key: &str, elem: &str) -> Result<String> {
    get_attribute(attrs, key).ok_or_else(|| Error::malformed(format!("<{}> without a `{}` attribute", elem, key)))
}

struct Parser<R: io::Read> {
    src: EventReader<R>,
}

impl<R: io::Read> Parser<R> {
    fn new(src: R) -> Parser<R> {
        // mixed content such as `<param>const <ptype>GLchar</ptype> *<name>name</name></param>`
        // needs its whitespace kept verbatim
        let config = ParserConfig::new()
            .trim_whitespace(false)
            .whitespace_to_characters(true)
            .cdata_to_characters(true)
            .ignore_comments(true)
            .coalesce_characters(true);
        Parser { src: EventReader::new_with_config(src, config) }
    }

    /// Returns `None` at the end of the document.
    fn next(&mut self) -> Result<Option<ParseEvent>> {
        loop {
            match self.src.next()? {
                XmlEvent::EndDocument => return Ok(None),
                XmlEvent::StartElement { name, attributes, .. } => {
                    let attributes = attributes
                        .into_iter()
                        .map(|attr| Attribute { key: attr.name.local_name, value: attr.value })
                        .collect();
                    return Ok(Some(ParseEvent::Start(name.local_name, attributes)));
                },
                XmlEvent::EndElement { name } => return Ok(Some(ParseEvent::End(name.local_name))),
                XmlEvent::Characters(text) | XmlEvent::Whitespace(text) | XmlEvent::CData(text) => {
                    return Ok(Some(ParseEvent::Text(text)))
                },
                _ => {},
            }
        }
    }

    fn expect_next(&mut self, within: &str) -> Result<ParseEvent> {
        self.next()?
            .ok_or_else(|| Error::malformed(format!("unexpected end of document inside <{}>", within)))
    }

    /// Consumes everything up to and including the end tag of the element `name`
    /// whose start tag was just read.
    fn skip_to_end(&mut self, name: &str) -> Result<()> {
        let mut depth = 0usize;
        loop {
            match self.expect_next(name)? {
                ParseEvent::Start(..) => depth += 1,
                ParseEvent::End(ref end) if depth == 0 => {
                    debug_assert_eq!(end, name);
                    return Ok(());
                },
                ParseEvent::End(_) => depth -= 1,
                ParseEvent::Text(_) => {},
            }
        }
    }

    /// Like `skip_to_end`, but collects the text of the element and all of its
    /// descendants.
    fn consume_text(&mut self, name: &str) -> Result<String> {
        let mut text = String::new();
        let mut depth = 0usize;
        loop {
            match self.expect_next(name)? {
                ParseEvent::Start(..) => depth += 1,
                ParseEvent::End(_) if depth == 0 => return Ok(text),
                ParseEvent::End(_) => depth -= 1,
                ParseEvent::Text(t) => text.push_str(&t),
            }
        }
    }

    fn parse_registry(&mut self) -> Result<Registry> {
        loop {
            match self.next()? {
                Some(ParseEvent::Start(ref name, _)) if name == "registry" => break,
                Some(ParseEvent::Start(name, _)) => {
                    return Err(Error::malformed(format!("expected <registry> root element, found <{}>", name)))
                },
                Some(_) => {},
                None => return Err(Error::malformed("document has no root element")),
            }
        }

        let mut cmds = Vec::new();
        let mut enum_groups = Vec::new();
        let mut extensions = Vec::new();
        let (mut seen_cmds, mut seen_enums, mut seen_exts) = (false, false, false);

        loop {
            match self.expect_next("registry")? {
                ParseEvent::Start(name, _) => match &*name {
                    "commands" => {
                        seen_cmds = true;
                        self.parse_commands(&mut cmds)?;
                    },
                    "enums" => {
                        seen_enums = true;
                        enum_groups.push(self.parse_enum_group()?);
                    },
                    "extensions" => {
                        seen_exts = true;
                        self.parse_extensions(&mut extensions)?;
                    },
                    _ => self.skip_to_end(&name)?,
                },
                ParseEvent::End(_) => break,
                ParseEvent::Text(_) => {},
            }
        }

        for &(seen, section) in &[(seen_cmds, "commands"), (seen_enums, "enums"), (seen_exts, "extensions")] {
            if !seen {
                return Err(Error::malformed(format!("missing <{}> section", section)));
            }
        }

        debug!(
            "parsed registry: {} commands, {} enum groups, {} extensions",
            cmds.len(),
            enum_groups.len(),
            extensions.len()
        );

        Ok(Registry::from_parts(cmds, enum_groups, extensions))
    }

    fn parse_commands(&mut self, cmds: &mut Vec<Cmd>) -> Result<()> {
        loop {
            match self.expect_next("commands")? {
                ParseEvent::Start(ref name, _) if name == "command" => cmds.push(self.parse_command()?),
                ParseEvent::Start(name, _) => self.skip_to_end(&name)?,
                ParseEvent::End(_) => return Ok(()),
                ParseEvent::Text(_) => {},
            }
        }
    }

    fn parse_command(&mut self) -> Result<Cmd> {
        let mut proto = None;
        let mut params = Vec::new();

        loop {
            match self.expect_next("command")? {
                ParseEvent::Start(name, _) => match &*name {
                    "proto" => proto = Some(self.parse_proto()?),
                    "param" => params.push(Param { text: self.consume_text("param")? }),
                    // glx, alias, vecequiv
                    _ => self.skip_to_end(&name)?,
                },
                ParseEvent::End(_) => break,
                ParseEvent::Text(_) => {},
            }
        }

        let proto = proto.ok_or_else(|| Error::malformed("<command> without <proto>"))?;
        Ok(Cmd { proto, params })
    }

    fn parse_proto(&mut self) -> Result<Proto> {
        let mut lead = String::new();
        let mut seen_child = false;
        let mut ptype = None;
        let mut ident = None;

        loop {
            match self.expect_next("proto")? {
                ParseEvent::Text(text) => {
                    if !seen_child {
                        lead.push_str(&text);
                    }
                },
                ParseEvent::Start(name, _) => {
                    seen_child = true;
                    let text = self.consume_text(&name)?;
                    match &*name {
                        "ptype" if ptype.is_none() => ptype = Some(text),
                        "name" => ident = Some(text),
                        _ => {},
                    }
                },
                ParseEvent::End(_) => break,
            }
        }

        let ident = ident.ok_or_else(|| Error::malformed("<proto> without <name>"))?;
        Ok(Proto { ident, lead, ptype })
    }

    fn parse_enum_group(&mut self) -> Result<EnumGroup> {
        let mut group = EnumGroup::default();

        loop {
            match self.expect_next("enums")? {
                ParseEvent::Start(name, attrs) => {
                    if name == "enum" {
                        group.enums.push(Enum {
                            ident: require_attribute(&attrs, "name", "enum")?,
                            api: get_attribute(&attrs, "api"),
                            value: get_attribute(&attrs, "value"),
                        });
                    }
                    self.skip_to_end(&name)?;
                },
                ParseEvent::End(_) => return Ok(group),
                ParseEvent::Text(_) => {},
            }
        }
    }

    fn parse_extensions(&mut self, extensions: &mut Vec<Extension>) -> Result<()> {
        loop {
            match self.expect_next("extensions")? {
                ParseEvent::Start(ref name, ref attrs) if name == "extension" => {
                    extensions.push(self.parse_extension(attrs)?)
                },
                ParseEvent::Start(name, _) => self.skip_to_end(&name)?,
                ParseEvent::End(_) => return Ok(()),
                ParseEvent::Text(_) => {},
            }
        }
    }

    fn parse_extension(&mut self, attrs: &[Attribute]) -> Result<Extension> {
        let name = require_attribute(attrs, "name", "extension")?;
        let supported = require_attribute(attrs, "supported", "extension")?
            .split('|')
            .map(str::to_owned)
            .collect();
        let mut requires = Vec::new();

        loop {
            match self.expect_next("extension")? {
                ParseEvent::Start(ref elem, ref attrs) if elem == "require" => requires.push(self.parse_require(attrs)?),
                // <remove> only appears on features
                ParseEvent::Start(elem, _) => self.skip_to_end(&elem)?,
                ParseEvent::End(_) => break,
                ParseEvent::Text(_) => {},
            }
        }

        Ok(Extension { name, supported, requires })
    }

    fn parse_require(&mut self, attrs: &[Attribute]) -> Result<Require> {
        let mut require = Require { api: get_attribute(attrs, "api"), items: Vec::new() };

        loop {
            match self.expect_next("require")? {
                ParseEvent::Start(elem, attrs) => {
                    let item = match &*elem {
                        "command" => Some(Reference::Command(require_attribute(&attrs, "name", "command")?)),
                        "enum" => Some(Reference::Enum(require_attribute(&attrs, "name", "enum")?)),
                        "type" => Some(Reference::Type(require_attribute(&attrs, "name", "type")?)),
                        _ => None,
                    };
                    require.items.extend(item);
                    self.skip_to_end(&elem)?;
                },
                ParseEvent::End(_) => return Ok(require),
                ParseEvent::Text(_) => {},
            }
        }
    }
}

pub fn from_xml<R>(src: R) -> Result<Registry>
where R: io::Read {
    Parser::new(src).parse_registry()
}
