////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt, io,
    str::FromStr,
};

use crate::generators::Generator;
use crate::{Error, Result};

mod parse;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Api {
    Gl,
    Glx,
    Wgl,
    Egl,
    GlCore,
    Gles1,
    Gles2,
    Glsc2,
}

impl Api {
    /// The tag used for this API in `supported` and `api` attributes.
    pub fn as_str(self) -> &'static str {
        match self {
            Api::Gl => "gl",
            Api::Glx => "glx",
            Api::Wgl => "wgl",
            Api::Egl => "egl",
            Api::GlCore => "glcore",
            Api::Gles1 => "gles1",
            Api::Gles2 => "gles2",
            Api::Glsc2 => "glsc2",
        }
    }

    /// The preamble the generated declarations lean on for the base typedefs
    /// (`GLenum`, ...) and the `GL_APIENTRY` calling convention, neither of
    /// which is generated.
    ///
    /// The GLES and GLSC2 headers define `GL_APIENTRY` through their platform
    /// headers. Desktop GL and EGL only define `APIENTRY`/`EGLAPIENTRY`, so it
    /// is mapped onto those.
    pub fn compat_include(self) -> &'static str {
        match self {
            Api::Gl | Api::GlCore => {
                "#include <GL/glcorearb.h>\n#ifndef GL_APIENTRY\n#define GL_APIENTRY APIENTRY\n#endif"
            },
            Api::Glx => "#include <GL/glx.h>\n#ifndef GL_APIENTRY\n#define GL_APIENTRY APIENTRY\n#endif",
            Api::Wgl => {
                "#include <windows.h>\n#include <GL/gl.h>\n#ifndef GL_APIENTRY\n#define GL_APIENTRY APIENTRY\n#endif"
            },
            Api::Egl => "#include <EGL/egl.h>\n#ifndef GL_APIENTRY\n#define GL_APIENTRY EGLAPIENTRY\n#endif",
            Api::Gles1 => "#include <GLES/gl.h>",
            Api::Gles2 => "#include <GLES2/gl2.h>",
            Api::Glsc2 => "#include <GLSC2/glsc2.h>",
        }
    }
}

impl FromStr for Api {
    type Err = Error;

    fn from_str(s: &str) -> Result<Api> {
        match s {
            "gl" => Ok(Api::Gl),
            "glx" => Ok(Api::Glx),
            "wgl" => Ok(Api::Wgl),
            "egl" => Ok(Api::Egl),
            "glcore" => Ok(Api::GlCore),
            "gles1" => Ok(Api::Gles1),
            "gles2" => Ok(Api::Gles2),
            "glsc2" => Ok(Api::Glsc2),
            _ => Err(Error::UnknownApi(s.to_owned())),
        }
    }
}

impl fmt::Display for Api {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(self.as_str())
    }
}

/// A `<proto>` element.
///
/// Only the pieces the typedef needs are kept: the text before the first child
/// element and the text of the first `<ptype>`. Anything after the `<ptype>`
/// (trailing `*`, `const`) is dropped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Proto {
    pub ident: String,
    pub lead: String,
    pub ptype: Option<String>,
}

/// A `<param>` element, kept as its full concatenated text (`const GLchar *name`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Param {
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cmd {
    pub proto: Proto,
    pub params: Vec<Param>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enum {
    pub ident: String,
    pub api: Option<String>,
    pub value: Option<String>,
}

/// One `<enums>` block. Names may repeat across groups with different values.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EnumGroup {
    pub enums: Vec<Enum>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reference {
    Command(String),
    Enum(String),
    Type(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Require {
    pub api: Option<String>,
    pub items: Vec<Reference>,
}

impl Require {
    /// Whether this block applies when generating for `api`.
    pub fn applies_to(&self, api: Api) -> bool {
        match self.api {
            Some(ref tag) => tag == api.as_str(),
            None => true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Extension {
    pub name: String,
    pub supported: BTreeSet<String>,
    pub requires: Vec<Require>,
}

impl Extension {
    pub fn supports(&self, api: Api) -> bool {
        self.supported.contains(api.as_str())
    }
}

/// A parsed registry document. Everything is kept in document order.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    pub cmds: Vec<Cmd>,
    pub enum_groups: Vec<EnumGroup>,
    pub extensions: Vec<Extension>,
    cmd_index: BTreeMap<String, usize>,
}

impl Registry {
    /// Parses a registry document such as `gl.xml` or `egl.xml`.
    pub fn from_xml<R>(src: R) -> Result<Registry>
    where R: io::Read {
        parse::from_xml(src)
    }

    pub(crate) fn from_parts(cmds: Vec<Cmd>, enum_groups: Vec<EnumGroup>, extensions: Vec<Extension>) -> Registry {
        let mut cmd_index = BTreeMap::new();
        for (i, cmd) in cmds.iter().enumerate() {
            if cmd_index.contains_key(&cmd.proto.ident) {
                warn!("duplicate definition of command {}, keeping the first", cmd.proto.ident);
                continue;
            }
            cmd_index.insert(cmd.proto.ident.clone(), i);
        }

        Registry { cmds, enum_groups, extensions, cmd_index }
    }

    /// Runs `generator` over this registry, writing declarations to `header` and
    /// the capability table to `body`.
    pub fn write_loaders<G, H, B>(&self, generator: G, header: &mut H, body: &mut B) -> Result<()>
    where
        G: Generator,
        H: io::Write,
        B: io::Write,
    {
        generator.write(self, header, body)
    }

    /// Looks up a command by name.
    pub fn find_cmd(&self, name: &str) -> Result<&Cmd> {
        self.cmd_index
            .get(name)
            .map(|&i| &self.cmds[i])
            .ok_or_else(|| Error::command_not_found(name))
    }

    /// Looks up an enum by name.
    ///
    /// Groups are scanned in document order and the first entry with a matching
    /// name *and* a value wins. The entry's `api` attribute is not consulted.
    pub fn find_enum(&self, name: &str) -> Result<&Enum> {
        self.enum_groups
            .iter()
            .flat_map(|group| group.enums.iter())
            .find(|enm| enm.ident == name && enm.value.is_some())
            .ok_or_else(|| Error::enum_not_found(name))
    }
}

impl FromStr for Registry {
    type Err = Error;

    fn from_str(s: &str) -> Result<Registry> {
        Registry::from_xml(s.as_bytes())
    }
}
