use kiln::context::GeneratorContext;
use kiln::error::{Error, RuleLocation};
use kiln::renderer::MiniJinjaRenderer;
use kiln::resolver::{apply_base_path, is_rendered_path_valid, resolve, DestinationRegistry};
use kiln::rules::{DestPath, FileSpec};
use std::path::{Path, PathBuf};

fn location() -> RuleLocation {
    RuleLocation::block("test", 0)
}

#[test]
fn test_computed_destination_uses_java_dir() {
    let renderer = MiniJinjaRenderer::new();
    let ctx = GeneratorContext::new().with("javaDir", "com/acme");
    let spec = FileSpec::templated("Foo.java")
        .rename_to(|ctx| Ok(format!("src/main/java/{}/Foo.java", ctx.get_str("javaDir")?)));

    let (source_id, dest) = resolve(&spec, None, &ctx, &renderer, &location()).unwrap();
    assert_eq!(source_id, "Foo.java");
    assert_eq!(dest, PathBuf::from("src/main/java/com/acme/Foo.java"));
}

#[test]
fn test_literal_and_base_path() {
    let renderer = MiniJinjaRenderer::new();
    let ctx = GeneratorContext::new();
    let spec = FileSpec::from("build.gradle");

    let (_, dest) = resolve(&spec, Some("api/"), &ctx, &renderer, &location()).unwrap();
    assert_eq!(dest, PathBuf::from("api/build.gradle"));

    let (_, dest) = resolve(&spec, None, &ctx, &renderer, &location()).unwrap();
    assert_eq!(dest, PathBuf::from("build.gradle"));
}

#[test]
fn test_fixed_destination_defaults_to_source() {
    let renderer = MiniJinjaRenderer::new();
    let ctx = GeneratorContext::new();

    let spec = FileSpec::copy_text("gradlew");
    let (_, dest) = resolve(&spec, None, &ctx, &renderer, &location()).unwrap();
    assert_eq!(dest, PathBuf::from("gradlew"));

    let spec = FileSpec::templated("gitignore").with_dest(DestPath::Fixed(".gitignore".into()));
    let (source_id, dest) = resolve(&spec, Some("service/"), &ctx, &renderer, &location()).unwrap();
    assert_eq!(source_id, "gitignore");
    assert_eq!(dest, PathBuf::from("service/.gitignore"));
}

#[test]
fn test_rename_output_is_authoritative() {
    let renderer = MiniJinjaRenderer::new();
    let ctx = GeneratorContext::new().with("javaDir", "com/acme/");
    // Flattens the package hierarchy into a single segment.
    let spec = FileSpec::templated("package/Foo.java")
        .rename_to(|ctx| Ok(format!("src/{}/Foo.java", ctx.get_str("javaDir")?.replace('/', "_"))));

    let (_, dest) = resolve(&spec, None, &ctx, &renderer, &location()).unwrap();
    assert_eq!(dest, PathBuf::from("src/com_acme_/Foo.java"));
}

#[test]
fn test_absolute_destination_ignores_base_path() {
    assert_eq!(apply_base_path(Some("api/"), "/tmp/out.txt"), PathBuf::from("/tmp/out.txt"));
    assert_eq!(apply_base_path(Some(""), "out.txt"), PathBuf::from("out.txt"));
}

#[test]
fn test_rendered_destination() {
    let renderer = MiniJinjaRenderer::new();
    let ctx = GeneratorContext::new().with("javaDir", "com/acme").with("baseName", "shop");
    let spec = FileSpec::templated("package/App.java").with_dest(DestPath::Rendered(
        "src/main/java/{{ javaDir }}/{{ baseName }}/{{ baseName | pascal_case }}App.java".into(),
    ));

    let (_, dest) = resolve(&spec, None, &ctx, &renderer, &location()).unwrap();
    assert_eq!(dest, PathBuf::from("src/main/java/com/acme/shop/ShopApp.java"));
}

#[test]
fn test_rendered_destination_with_missing_option() {
    let renderer = MiniJinjaRenderer::new();
    let ctx = GeneratorContext::new().with("javaDir", "com/acme");
    let spec = FileSpec::templated("package/App.java")
        .with_dest(DestPath::Rendered("src/{{ javaDir }}/{{ baseName }}/App.java".into()));

    let err = resolve(&spec, None, &ctx, &renderer, &location()).unwrap_err();
    assert!(matches!(err, Error::PathError { .. }));
}

#[test]
fn test_rendered_destination_with_missing_file_name() {
    let renderer = MiniJinjaRenderer::new();
    let ctx = GeneratorContext::new().with("javaDir", "com/acme");

    for template in ["src/{{ javaDir }}/{{ baseName }}.java", "src/{{ javaDir }}/{{ baseName }}"] {
        let spec = FileSpec::templated("package/App.java")
            .with_dest(DestPath::Rendered(template.into()));
        match resolve(&spec, Some("api/"), &ctx, &renderer, &location()).unwrap_err() {
            Error::PathError { location, reason } => {
                assert_eq!(location.group, "test");
                assert!(reason.contains("baseName"), "unexpected reason: {reason}");
            }
            other => panic!("Expected PathError, got {other:?}"),
        }
    }
}

#[test]
fn test_rendered_destination_must_name_a_file() {
    let renderer = MiniJinjaRenderer::new();
    let ctx = GeneratorContext::new().with("javaDir", "com/acme");
    let spec = FileSpec::templated("package/App.java")
        .with_dest(DestPath::Rendered("src/{{ javaDir }}/".into()));

    let err = resolve(&spec, None, &ctx, &renderer, &location()).unwrap_err();
    assert!(matches!(err, Error::PathError { .. }));
}

#[test]
fn test_failing_rename_is_path_error() {
    let renderer = MiniJinjaRenderer::new();
    let ctx = GeneratorContext::new();
    let spec =
        FileSpec::templated("Foo.java").rename_to(|ctx| Ok(ctx.get_str("javaDir")?.to_string()));

    match resolve(&spec, None, &ctx, &renderer, &location()).unwrap_err() {
        Error::PathError { location, reason } => {
            assert_eq!(location.group, "test");
            assert!(reason.contains("javaDir"));
        }
        other => panic!("Expected PathError, got {other:?}"),
    }
}

#[test]
fn test_is_rendered_path_valid() {
    assert!(!is_rendered_path_valid(""));
    assert!(!is_rendered_path_valid("   "));
    assert!(!is_rendered_path_valid("output/"));
    assert!(is_rendered_path_valid("filename.txt"));
    assert!(is_rendered_path_valid("output/filename.txt"));
}

#[test]
fn test_registry_detects_collisions() {
    let mut registry = DestinationRegistry::new();
    let first = RuleLocation::block("a", 0).with_source("build.gradle");
    let second = RuleLocation::block("b", 0).with_source("other.gradle");

    registry.register(Path::new("api/build.gradle"), &first).unwrap();
    registry.register(Path::new("build.gradle"), &second).unwrap();
    assert_eq!(registry.len(), 2);

    let err = registry.register(Path::new("api//build.gradle"), &second).unwrap_err();
    match err {
        Error::DestinationCollision { path, first: existing, second: incoming } => {
            assert_eq!(path, PathBuf::from("api/build.gradle"));
            assert_eq!(existing, first);
            assert_eq!(incoming, second);
        }
        other => panic!("Expected DestinationCollision, got {other:?}"),
    }
}
