mod common;
use crate::common::init_tracing;

use std::error::Error;
use std::path::Path;

use buildwatch::watch::{decompose, relative_str, PathParts};

type TestResult = Result<(), Box<dyn Error>>;

fn parts(dir: &str, stem: &str, ext: Option<&str>) -> PathParts {
    PathParts {
        dir: dir.to_string(),
        stem: stem.to_string(),
        ext: ext.map(str::to_string),
    }
}

#[test]
fn decompose_plain_file_with_extension() -> TestResult {
    init_tracing();
    assert_eq!(
        decompose("art/hero.aseprite"),
        parts("art", "hero", Some("aseprite"))
    );
    Ok(())
}

#[test]
fn decompose_bare_file_name() -> TestResult {
    init_tracing();
    assert_eq!(decompose("build.hxml"), parts("", "build", Some("hxml")));
    Ok(())
}

#[test]
fn decompose_no_extension() -> TestResult {
    init_tracing();
    assert_eq!(decompose("art/hero"), parts("art", "hero", None));
    Ok(())
}

#[test]
fn decompose_multiple_dots_splits_on_last() -> TestResult {
    init_tracing();
    assert_eq!(
        decompose("build.js.hxml"),
        parts("", "build.js", Some("hxml"))
    );
    Ok(())
}

#[test]
fn decompose_leading_dot_is_not_an_extension() -> TestResult {
    init_tracing();
    assert_eq!(decompose(".gitignore"), parts("", ".gitignore", None));
    assert_eq!(
        decompose("src/.env.local"),
        parts("src", ".env", Some("local"))
    );
    Ok(())
}

#[test]
fn decompose_ignores_trailing_separators() -> TestResult {
    init_tracing();
    assert_eq!(decompose("art/hero/"), parts("art", "hero", None));
    assert_eq!(decompose("art/hero//"), parts("art", "hero", None));
    Ok(())
}

#[test]
fn decompose_nested_directories() -> TestResult {
    init_tracing();
    assert_eq!(
        decompose("src/art/tiles/forest_tiles.aseprite"),
        parts("src/art/tiles", "forest_tiles", Some("aseprite"))
    );
    Ok(())
}

#[test]
fn relative_str_strips_root_prefix() -> TestResult {
    init_tracing();

    let root = Path::new("/project");
    let path = Path::new("/project/src/Main.hx");
    assert_eq!(relative_str(root, path).as_deref(), Some("src/Main.hx"));

    // Unrelated path cannot be relativized.
    assert_eq!(relative_str(root, Path::new("/elsewhere/Main.hx")), None);

    Ok(())
}

#[test]
fn relative_str_resolves_symlinked_roots() -> TestResult {
    init_tracing();

    let tmp = tempfile::tempdir()?;
    let real = tmp.path().join("real");
    std::fs::create_dir_all(real.join("src"))?;
    std::fs::write(real.join("src/Main.hx"), b"")?;

    #[cfg(unix)]
    {
        let link = tmp.path().join("link");
        std::os::unix::fs::symlink(&real, &link)?;

        let rel = relative_str(&link, &real.join("src/Main.hx"));
        assert_eq!(rel.as_deref(), Some("src/Main.hx"));
    }

    Ok(())
}
