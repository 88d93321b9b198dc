use kiln::error::{Error, RuleLocation};
use kiln::materializer::{interpolate, Materializer};
use kiln::renderer::MiniJinjaRenderer;
use kiln::rules::{InterpolatePattern, Mode};
use kiln::store::{DirTemplateStore, MemoryTemplateStore};
use regex::Regex;
use serde_json::json;
use std::fs;
use tempfile::TempDir;

fn location() -> RuleLocation {
    RuleLocation::block("test", 0).with_source("source")
}

#[test]
fn test_interpolate_only_rewrites_matches() {
    let renderer = MiniJinjaRenderer::new();
    let pattern = Regex::new(kiln::constants::DEFAULT_INTERPOLATE_PATTERN).unwrap();
    let context = json!({"baseName": "shop", "serverPort": 8081});
    let text = "rootProject.name = \"<%= baseName %>\"\nport=<%=serverPort%>\nversion = ${version}\n";

    let result = interpolate(text, &pattern, &renderer, &context, &location()).unwrap();
    assert_eq!(result, "rootProject.name = \"shop\"\nport=8081\nversion = ${version}\n");
}

#[test]
fn test_interpolate_supports_filters() {
    let renderer = MiniJinjaRenderer::new();
    let pattern = Regex::new(kiln::constants::DEFAULT_INTERPOLATE_PATTERN).unwrap();
    let context = json!({"baseName": "sample shop"});

    let result =
        interpolate("class <%= baseName | pascal_case %>App", &pattern, &renderer, &context, &location())
            .unwrap();
    assert_eq!(result, "class SampleShopApp");
}

#[test]
fn test_interpolate_undefined_is_error() {
    let renderer = MiniJinjaRenderer::new();
    let pattern = Regex::new(kiln::constants::DEFAULT_INTERPOLATE_PATTERN).unwrap();

    let err = interpolate("<%= missing %>", &pattern, &renderer, &json!({}), &location()).unwrap_err();
    match err {
        Error::InterpolationError { reason, .. } => assert!(reason.contains("missing")),
        other => panic!("Expected InterpolationError, got {other:?}"),
    }
}

#[test]
fn test_escaped_pattern_leaves_default_markers() {
    let renderer = MiniJinjaRenderer::new();
    let store = MemoryTemplateStore::new()
        .with("checkstyle.xml", "<property value=\"<%= literal %>\"/>\n<!-- <%: baseName %> -->");
    let materializer = Materializer::new(&store, &renderer).unwrap();

    let bytes = materializer
        .materialize(
            "checkstyle.xml",
            Mode::Interpolate,
            &InterpolatePattern::Escaped,
            &json!({"baseName": "shop"}),
            &location(),
        )
        .unwrap();
    assert_eq!(
        String::from_utf8(bytes).unwrap(),
        "<property value=\"<%= literal %>\"/>\n<!-- shop -->"
    );
}

#[test]
fn test_custom_pattern() {
    let renderer = MiniJinjaRenderer::new();
    let store = MemoryTemplateStore::new().with("app.yml", "name: @@baseName@@\nport: ${PORT}");
    let materializer = Materializer::new(&store, &renderer).unwrap();
    let pattern = InterpolatePattern::custom(r"@@(\w+)@@").unwrap();

    let bytes = materializer
        .materialize("app.yml", Mode::Interpolate, &pattern, &json!({"baseName": "shop"}), &location())
        .unwrap();
    assert_eq!(bytes, b"name: shop\nport: ${PORT}");
}

#[test]
fn test_copy_modes_do_not_alter_bytes() {
    let renderer = MiniJinjaRenderer::new();
    let jar: Vec<u8> = vec![0x50, 0x4b, 0x03, 0x04, 0xff, 0x00, 0xfe, 0x3c, 0x25, 0x3d];
    let script = "#!/bin/sh\necho \"<%= baseName %>\" ${APP_HOME}\n";
    let store = MemoryTemplateStore::new()
        .with("gradle/wrapper/gradle-wrapper.jar", jar.clone())
        .with("gradlew", script);
    let materializer = Materializer::new(&store, &renderer).unwrap();
    let context = json!({"baseName": "shop"});

    let binary = materializer
        .materialize(
            "gradle/wrapper/gradle-wrapper.jar",
            Mode::CopyBinary,
            &InterpolatePattern::Default,
            &context,
            &location(),
        )
        .unwrap();
    assert_eq!(binary, jar);

    let text = materializer
        .materialize("gradlew", Mode::CopyText, &InterpolatePattern::Default, &context, &location())
        .unwrap();
    assert_eq!(text, script.as_bytes());
}

#[test]
fn test_copy_text_rejects_binary() {
    let renderer = MiniJinjaRenderer::new();
    let store = MemoryTemplateStore::new().with("blob", vec![0xff, 0xfe, 0x00]);
    let materializer = Materializer::new(&store, &renderer).unwrap();

    let err = materializer
        .materialize("blob", Mode::CopyText, &InterpolatePattern::Default, &json!({}), &location())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidText { .. }));
}

#[test]
fn test_missing_template() {
    let renderer = MiniJinjaRenderer::new();
    let store = MemoryTemplateStore::new();
    let materializer = Materializer::new(&store, &renderer).unwrap();

    let err = materializer
        .materialize("nope", Mode::Interpolate, &InterpolatePattern::Default, &json!({}), &location())
        .unwrap_err();
    match err {
        Error::TemplateNotFound { location } => {
            assert_eq!(location.source_id.as_deref(), Some("source"))
        }
        other => panic!("Expected TemplateNotFound, got {other:?}"),
    }
}

#[test]
fn test_unreadable_source_names_rule() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("gradle/wrapper/gradle-wrapper.jar")).unwrap();
    let store = DirTemplateStore::new(temp_dir.path()).unwrap();
    let renderer = MiniJinjaRenderer::new();
    let materializer = Materializer::new(&store, &renderer).unwrap();
    let location =
        RuleLocation::block("serverBuild", 1).with_source("gradle/wrapper/gradle-wrapper.jar");

    let err = materializer
        .materialize(
            "gradle/wrapper/gradle-wrapper.jar",
            Mode::CopyBinary,
            &InterpolatePattern::Default,
            &json!({}),
            &location,
        )
        .unwrap_err();

    let message = err.to_string();
    assert!(matches!(err, Error::SourceError { .. }));
    assert!(message.contains("serverBuild[1]"), "unexpected message: {message}");
    assert!(message.contains("'gradle/wrapper/gradle-wrapper.jar'"), "unexpected message: {message}");
    assert!(message.contains(&temp_dir.path().display().to_string()), "unexpected message: {message}");
}

#[test]
fn test_suffixed_source_is_only_interpolated() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(
        temp_dir.path().join("build.gradle.j2"),
        "{% if true %}group = '<%= baseName %>'{% endif %}\n",
    )
    .unwrap();
    let store = DirTemplateStore::new(temp_dir.path()).unwrap();
    let renderer = MiniJinjaRenderer::new();
    let materializer = Materializer::new(&store, &renderer).unwrap();

    let bytes = materializer
        .materialize(
            "build.gradle",
            Mode::Interpolate,
            &InterpolatePattern::Default,
            &json!({"baseName": "shop"}),
            &location(),
        )
        .unwrap();
    assert_eq!(bytes, b"{% if true %}group = 'shop'{% endif %}\n");
}
