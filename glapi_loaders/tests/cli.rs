use std::fs;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use pretty_assertions::assert_eq;

const REGISTRY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<registry>
    <enums namespace="GL">
        <enum value="0x1" name="GL_BAR"/>
    </enums>
    <commands namespace="GL">
        <command>
            <proto>void <name>glFoo</name></proto>
        </command>
    </commands>
    <extensions>
        <extension name="EXT_x" supported="gles2|gl">
            <require>
                <command name="glFoo"/>
                <enum name="GL_BAR"/>
            </require>
        </extension>
    </extensions>
</registry>
"#;

const HEADER: &str = "\
#include <GLES2/gl2.h>

#ifndef EXT_x
#define EXT_x 1

typedef void (GL_APIENTRY * PFNGLFOOPROC)();
#define GL_BAR 0x1

#endif /* EXT_x */

";

const TABLE: &str = "\
struct extensions
{

\t/* EXT_x */
\tbool have_EXT_x;
\tPFNGLFOOPROC func_glFoo;

};

";

fn run(args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_gen-glapi-loaders"))
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .unwrap();
    child.stdin.take().unwrap().write_all(stdin).unwrap();
    child.wait_with_output().unwrap()
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn stdout(out: &Output) -> String {
    String::from_utf8(out.stdout.clone()).unwrap()
}

fn stderr(out: &Output) -> String {
    String::from_utf8(out.stderr.clone()).unwrap()
}

fn entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn stdin_to_stdout_writes_header_then_table() {
    let out = run(&[], REGISTRY.as_bytes());
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(stdout(&out), format!("{}{}", HEADER, TABLE));
}

#[test]
fn outfile_gets_header_and_stdout_the_table() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("gl.xml");
    let header = dir.path().join("out.h");
    fs::write(&input, REGISTRY).unwrap();

    let out = run(&[path_arg(&input), path_arg(&header)], b"");
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(fs::read_to_string(&header).unwrap(), HEADER);
    assert_eq!(stdout(&out), TABLE);
}

#[test]
fn split_sinks() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("gl.xml");
    let header = dir.path().join("out.h");
    let table = dir.path().join("table.h");
    fs::write(&input, REGISTRY).unwrap();

    let out = run(&[path_arg(&input), path_arg(&header), "--table", path_arg(&table)], b"");
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(fs::read_to_string(&header).unwrap(), HEADER);
    assert_eq!(fs::read_to_string(&table).unwrap(), TABLE);
    assert!(out.stdout.is_empty());
    assert_eq!(entries(dir.path()), vec!["gl.xml", "out.h", "table.h"]);
}

#[test]
fn header_and_table_may_share_a_file() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("gl.xml");
    let header = dir.path().join("out.h");
    fs::write(&input, REGISTRY).unwrap();

    let out = run(&[path_arg(&input), path_arg(&header), "--table", path_arg(&header)], b"");
    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(fs::read_to_string(&header).unwrap(), format!("{}{}", HEADER, TABLE));
}

#[test]
fn missing_command_creates_no_files() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("gl.xml");
    let header = dir.path().join("out.h");
    let table = dir.path().join("table.h");
    fs::write(&input, REGISTRY.replace("<command name=\"glFoo\"/>", "<command name=\"glNope\"/>")).unwrap();

    let out = run(&[path_arg(&input), path_arg(&header), "--table", path_arg(&table)], b"");
    assert!(!out.status.success());
    assert!(stderr(&out).contains("could not find command: glNope"), "{}", stderr(&out));
    assert!(out.stdout.is_empty());
    assert_eq!(entries(dir.path()), vec!["gl.xml"]);
}

#[test]
fn uncreatable_table_leaves_no_header() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("gl.xml");
    let header = dir.path().join("out.h");
    let table = dir.path().join("nodir").join("table.h");
    fs::write(&input, REGISTRY).unwrap();

    let out = run(&[path_arg(&input), path_arg(&header), "--table", path_arg(&table)], b"");
    assert!(!out.status.success());
    assert!(stderr(&out).contains("could not create"), "{}", stderr(&out));
    assert!(out.stdout.is_empty());
    assert_eq!(entries(dir.path()), vec!["gl.xml"]);
}

#[test]
fn include_override_replaces_preamble() {
    let out = run(&["--include", "#include \"compat.h\""], REGISTRY.as_bytes());
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(stdout(&out).starts_with("#include \"compat.h\"\n\n#ifndef EXT_x\n"));
}

#[test]
fn api_selects_preamble_and_extensions() {
    let out = run(&["--api", "gl"], REGISTRY.as_bytes());
    assert!(out.status.success(), "{}", stderr(&out));
    let text = stdout(&out);
    assert!(text.starts_with("#include <GL/glcorearb.h>\n#ifndef GL_APIENTRY\n"));
    assert!(text.contains("bool have_EXT_x;"));

    let out = run(&["--api", "gles1"], REGISTRY.as_bytes());
    assert!(out.status.success(), "{}", stderr(&out));
    assert!(!stdout(&out).contains("EXT_x"));
}

#[test]
fn unknown_api_is_rejected() {
    let out = run(&["--api", "vulkan"], REGISTRY.as_bytes());
    assert!(!out.status.success());
    assert!(stderr(&out).contains("unknown api: vulkan"), "{}", stderr(&out));
    assert!(out.stdout.is_empty());
}

#[test]
fn invalid_utf8_on_stdin_is_an_xml_error() {
    let mut input = b"<registry><commands/><enums/><extensions><extension name=\"".to_vec();
    input.extend_from_slice(&[0xff, 0xfe]);
    input.extend_from_slice(b"\" supported=\"gles2\"/></extensions></registry>");

    let out = run(&[], &input);
    assert!(!out.status.success());
    assert!(stderr(&out).contains("Error: xml:"), "{}", stderr(&out));
    assert!(out.stdout.is_empty());
}
