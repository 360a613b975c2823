////////////////////////////////////////////////////////////////////////////////////
// Copyright (c) 2019 DasEtwas - All Rights Reserved                               /
//      Unauthorized copying of this file, via any medium is strictly prohibited   /
//      Proprietary and confidential                                               /
////////////////////////////////////////////////////////////////////////////////////

use std::io;

use crate::registry::{Cmd, Enum, Proto, Registry};
use crate::Result;

pub mod extension_loader_gen;

/// Calling convention token placed in every function pointer typedef.
pub const APIENTRY: &str = "GL_APIENTRY";

/// Trait for a loader generator.
///
/// Declarations go to `header`, the capability table to `body`. Implementations
/// must not write anything if generation fails.
pub trait Generator {
    fn write<H, B>(&self, registry: &Registry, header: &mut H, body: &mut B) -> Result<()>
    where
        H: io::Write,
        B: io::Write;
}

/// Generates the function pointer type name of a command.
///
/// Example results: `"PFNGLCLEARPROC"`, `"PFNEGLCREATECONTEXTPROC"`.
pub fn gen_typename(cmd: &str) -> String {
    format!("PFN{}PROC", cmd.to_uppercase())
}

/// Generates the name of a command's field in the capability table.
pub fn gen_member_name(cmd: &str) -> String {
    format!("func_{}", cmd)
}

/// Best-effort return type of a command: the text before the first child of
/// `<proto>` followed by the `<ptype>` text.
///
/// Whatever follows the `<ptype>` is lost, so `const <ptype>GLubyte</ptype> *`
/// comes out as `const GLubyte`.
pub fn gen_return_type(proto: &Proto) -> String {
    let mut ty = proto.lead.clone();
    if let Some(ref ptype) = proto.ptype {
        ty.push_str(ptype);
    }
    ty.trim().to_owned()
}

/// Generates the parameter list of a command, e.g. `"GLenum target, GLuint id"`.
pub fn gen_parameters(cmd: &Cmd) -> String {
    cmd.params.iter().map(|param| param.text.trim()).collect::<Vec<_>>().join(", ")
}

/// Generates a `typedef ret (GL_APIENTRY * PFN...PROC)(params);` line.
pub fn gen_typedef(cmd: &Cmd) -> String {
    format!(
        "typedef {ret} ({apientry} * {typename})({params});",
        ret = gen_return_type(&cmd.proto),
        apientry = APIENTRY,
        typename = gen_typename(&cmd.proto.ident),
        params = gen_parameters(cmd),
    )
}

/// Generates a `#define NAME value` line. The value is copied verbatim.
///
/// Returns `None` for an enum without a value, which `Registry::find_enum` never
/// hands out.
pub fn gen_enum_define(enm: &Enum) -> Option<String> {
    enm.value.as_ref().map(|value| format!("#define {} {}", enm.ident, value))
}
