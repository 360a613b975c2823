////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2020 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use std::{collections::HashSet, io};

use crate::registry::{Api, Extension, Reference, Registry};
use crate::{Error, Result};

/// Commands already emitted during one generation run.
///
/// A command required by several extensions gets its typedef and table field
/// only the first time it is seen.
#[derive(Debug, Default)]
pub struct EmissionState {
    emitted: HashSet<String>,
}

impl EmissionState {
    pub fn new() -> EmissionState {
        EmissionState::default()
    }

    pub fn is_emitted(&self, cmd: &str) -> bool {
        self.emitted.contains(cmd)
    }

    /// Returns `false` if the command was already emitted.
    pub fn mark_emitted(&mut self, cmd: &str) -> bool {
        self.emitted.insert(cmd.to_owned())
    }

    pub fn len(&self) -> usize {
        self.emitted.len()
    }
}

/// The lines one extension contributes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtensionOutput {
    /// Header lines: the include guard and the typedefs and defines inside it.
    pub defs: Vec<String>,
    /// Capability table fields.
    pub members: Vec<String>,
}

/// Emits everything `ext` requires for `api`.
///
/// Enums are re-emitted every time they are required; only commands are
/// deduplicated through `state`. Any lookup failure aborts the whole run.
pub fn process_extension(registry: &Registry, ext: &Extension, api: Api, state: &mut EmissionState) -> Result<ExtensionOutput> {
    let name = &*ext.name;
    let mut out = ExtensionOutput::default();

    out.members.push(format!("/* {} */", name));
    out.members.push(format!("bool have_{};", name));

    out.defs.push(format!("#ifndef {}", name));
    out.defs.push(format!("#define {} 1", name));
    out.defs.push(String::new());

    for require in ext.requires.iter().filter(|require| require.applies_to(api)) {
        for item in &require.items {
            match *item {
                Reference::Command(ref cmd_name) => {
                    if state.is_emitted(cmd_name) {
                        trace!("{}: {} already emitted", name, cmd_name);
                        continue;
                    }
                    let cmd = registry.find_cmd(cmd_name)?;
                    out.defs.push(super::gen_typedef(cmd));
                    out.members.push(format!("{} {};", super::gen_typename(cmd_name), super::gen_member_name(cmd_name)));
                    state.mark_emitted(cmd_name);
                },
                Reference::Enum(ref enum_name) => {
                    let enm = registry.find_enum(enum_name)?;
                    let define = super::gen_enum_define(enm).ok_or_else(|| Error::enum_not_found(enum_name))?;
                    out.defs.push(define);
                },
                Reference::Type(_) => {},
            }
        }
    }

    out.defs.push(String::new());
    out.defs.push(format!("#endif /* {} */\n", name));
    out.members.push(String::new());

    Ok(out)
}

/// Accumulated output of a whole run, ready to be written.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Loaders {
    pub include: String,
    pub defs: Vec<String>,
    pub members: Vec<String>,
}

impl Loaders {
    /// Writes the compatibility include followed by every extension's guarded
    /// declarations.
    pub fn write_header<W>(&self, dest: &mut W) -> io::Result<()>
    where W: io::Write {
        writeln!(dest, "{}\n", self.include)?;
        writeln!(dest, "{}", self.defs.join("\n"))
    }

    /// Writes the `struct extensions` capability table.
    pub fn write_table<W>(&self, dest: &mut W) -> io::Result<()>
    where W: io::Write {
        writeln!(dest, "struct extensions\n{{\n")?;
        for member in &self.members {
            if member.is_empty() {
                writeln!(dest)?;
            } else {
                writeln!(dest, "\t{}", member)?;
            }
        }
        writeln!(dest, "}};\n")
    }
}

/// Generates extension loader declarations for a single API.
#[derive(Clone, Debug)]
pub struct ExtensionLoaderGenerator {
    pub api: Api,
    /// Preamble written at the top of the header, before any declaration.
    pub include: String,
}

impl ExtensionLoaderGenerator {
    pub fn new(api: Api) -> ExtensionLoaderGenerator {
        ExtensionLoaderGenerator { api, include: api.compat_include().to_owned() }
    }

    pub fn with_include<S: Into<String>>(mut self, include: S) -> ExtensionLoaderGenerator {
        self.include = include.into();
        self
    }

    /// Runs every supported extension through `process_extension` in document
    /// order. Nothing is written here, so a failure leaves no partial output.
    pub fn generate(&self, registry: &Registry) -> Result<Loaders> {
        let mut state = EmissionState::new();
        let mut loaders = Loaders { include: self.include.clone(), ..Loaders::default() };

        for ext in &registry.extensions {
            if !ext.supports(self.api) {
                debug!("skipping {}: not supported by {}", ext.name, self.api);
                continue;
            }
            debug!("processing {}", ext.name);
            let out = process_extension(registry, ext, self.api, &mut state)?;
            loaders.defs.extend(out.defs);
            loaders.members.extend(out.members);
        }

        info!("generated {} loader entry points for {}", state.len(), self.api);
        Ok(loaders)
    }
}

impl super::Generator for ExtensionLoaderGenerator {
    fn write<H, B>(&self, registry: &Registry, header: &mut H, body: &mut B) -> Result<()>
    where
        H: io::Write,
        B: io::Write,
    {
        let loaders = self.generate(registry)?;
        loaders.write_header(header)?;
        loaders.write_table(body)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Cmd, Enum, EnumGroup, Param, Proto, Require};
    use crate::ItemKind;
    use pretty_assertions::assert_eq;

    fn registry(extensions: Vec<Extension>) -> Registry {
        let cmd = |name: &str, params: &[&str]| Cmd {
            proto: Proto { ident: name.to_owned(), lead: "void ".to_owned(), ptype: None },
            params: params.iter().map(|p| Param { text: (*p).to_owned() }).collect(),
        };
        let enums = EnumGroup {
            enums: vec![Enum { ident: "GL_BAR".to_owned(), api: None, value: Some("0x1".to_owned()) }],
        };
        Registry::from_parts(vec![cmd("glFoo", &[]), cmd("glBaz", &["GLint x"])], vec![enums], extensions)
    }

    fn ext(name: &str, supported: &[&str], requires: Vec<Require>) -> Extension {
        Extension { name: name.to_owned(), supported: supported.iter().map(|s| (*s).to_owned()).collect(), requires }
    }

    fn require(api: Option<&str>, items: Vec<Reference>) -> Require {
        Require { api: api.map(str::to_owned), items }
    }

    fn command(name: &str) -> Reference {
        Reference::Command(name.to_owned())
    }

    #[test]
    fn processes_single_extension() {
        let e = ext("EXT_x", &["gles2"], vec![require(None, vec![command("glFoo"), Reference::Enum("GL_BAR".to_owned())])]);
        let reg = registry(vec![e.clone()]);
        let mut state = EmissionState::new();
        let out = process_extension(&reg, &e, Api::Gles2, &mut state).unwrap();

        assert_eq!(
            out.defs,
            vec![
                "#ifndef EXT_x",
                "#define EXT_x 1",
                "",
                "typedef void (GL_APIENTRY * PFNGLFOOPROC)();",
                "#define GL_BAR 0x1",
                "",
                "#endif /* EXT_x */\n",
            ]
        );
        assert_eq!(out.members, vec!["/* EXT_x */", "bool have_EXT_x;", "PFNGLFOOPROC func_glFoo;", ""]);
        assert!(state.is_emitted("glFoo"));
    }

    #[test]
    fn skips_require_blocks_for_other_apis() {
        let e = ext(
            "EXT_x",
            &["gl", "gles2"],
            vec![require(Some("gl"), vec![command("glFoo")]), require(Some("gles2"), vec![command("glBaz")])],
        );
        let reg = registry(vec![e.clone()]);
        let out = process_extension(&reg, &e, Api::Gles2, &mut EmissionState::new()).unwrap();

        assert_eq!(out.defs[3], "typedef void (GL_APIENTRY * PFNGLBAZPROC)(GLint x);");
        assert_eq!(out.defs.len(), 6);
    }

    #[test]
    fn already_emitted_commands_are_not_resolved_again() {
        // glMissing is not in the registry; a marked name must not be looked up
        let e = ext("EXT_x", &["gles2"], vec![require(None, vec![command("glMissing")])]);
        let reg = registry(vec![e.clone()]);
        let mut state = EmissionState::new();
        state.mark_emitted("glMissing");

        let out = process_extension(&reg, &e, Api::Gles2, &mut state).unwrap();
        assert_eq!(out.members, vec!["/* EXT_x */", "bool have_EXT_x;", ""]);
    }

    #[test]
    fn missing_command_aborts() {
        let e = ext("EXT_x", &["gles2"], vec![require(None, vec![command("glMissing")])]);
        let reg = registry(vec![e.clone()]);
        match process_extension(&reg, &e, Api::Gles2, &mut EmissionState::new()) {
            Err(Error::NotFound { kind: ItemKind::Command, name }) => assert_eq!(name, "glMissing"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn generate_dedups_commands_but_not_enums() {
        let shared = || require(None, vec![command("glFoo"), Reference::Enum("GL_BAR".to_owned())]);
        let reg = registry(vec![ext("EXT_a", &["gles2"], vec![shared()]), ext("EXT_b", &["gles2"], vec![shared()])]);
        let loaders = ExtensionLoaderGenerator::new(Api::Gles2).generate(&reg).unwrap();

        let count = |lines: &[String], needle: &str| lines.iter().filter(|l| l.contains(needle)).count();
        assert_eq!(count(&loaders.defs, "PFNGLFOOPROC"), 1);
        assert_eq!(count(&loaders.members, "func_glFoo"), 1);
        assert_eq!(count(&loaders.defs, "#define GL_BAR 0x1"), 2);
        assert_eq!(count(&loaders.members, "bool have_"), 2);
    }

    #[test]
    fn unsupported_extensions_contribute_nothing() {
        let reg = registry(vec![ext("EXT_gl_only", &["gl", "glcore"], vec![require(None, vec![command("glMissing")])])]);
        let loaders = ExtensionLoaderGenerator::new(Api::Gles2).generate(&reg).unwrap();
        assert!(loaders.defs.is_empty());
        assert!(loaders.members.is_empty());
    }

    #[test]
    fn table_layout() {
        let loaders = Loaders {
            include: String::new(),
            defs: Vec::new(),
            members: vec!["/* EXT_x */".to_owned(), "bool have_EXT_x;".to_owned(), String::new()],
        };
        let mut out = Vec::new();
        loaders.write_table(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "struct extensions\n{\n\n\t/* EXT_x */\n\tbool have_EXT_x;\n\n};\n\n");
    }

    #[test]
    fn custom_include_line() {
        let gen = ExtensionLoaderGenerator::new(Api::Gles2).with_include("#include \"gl_compat.h\"");
        let loaders = gen.generate(&registry(Vec::new())).unwrap();
        let mut out = Vec::new();
        loaders.write_header(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "#include \"gl_compat.h\"\n\n\n");
    }
}
