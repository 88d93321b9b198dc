use kiln::context::GeneratorContext;
use kiln::error::Error;
use kiln::generator::Generator;
use kiln::renderer::MiniJinjaRenderer;
use kiln::rules::loader::{load_rules, parse_rules};
use kiln::rules::{Condition, DestPath, FileSpec, Mode};
use kiln::store::MemoryTemplateStore;
use std::path::PathBuf;
use tempfile::TempDir;

const RULES: &str = r#"
serverBuild:
  - fileSpecs:
      - sourceId: checkstyle.xml
        options:
          interpolatePattern: escaped
  - condition: "buildTool == 'gradle'"
    fileSpecs:
      - build.gradle
      - sourceId: gradlew
        mode: copyText
      - sourceId: gradle/wrapper/gradle-wrapper.jar
        mode: copyBinary
serverMicroservice:
  - condition: "applicationType == 'microservice'"
    basePath: api/
    fileSpecs:
      - sourceId: src/main/java/package/Sample.java
        destPath:
          computed: "src/main/java/{{ javaDir }}/{{ baseName }}/Sample.java"
      - sourceId: gitignore
        destPath: .gitignore
"#;

#[test]
fn test_parse_rules_preserves_structure() {
    let renderer = MiniJinjaRenderer::new();
    let table = parse_rules(RULES, &renderer).unwrap();

    let names: Vec<_> = table.groups.iter().map(|g| g.name.as_str()).collect();
    assert_eq!(names, ["serverBuild", "serverMicroservice"]);

    let build = table.group("serverBuild").unwrap();
    assert!(build.blocks[0].condition.is_none());
    assert!(matches!(build.blocks[1].condition, Some(Condition::Expression(_))));
    assert!(matches!(build.blocks[1].file_specs[0], FileSpec::Literal(_)));
    assert_eq!(build.blocks[1].file_specs[1].mode(), Mode::CopyText);
    assert_eq!(build.blocks[1].file_specs[2].mode(), Mode::CopyBinary);

    let api = &table.group("serverMicroservice").unwrap().blocks[0];
    assert_eq!(api.base_path.as_deref(), Some("api/"));
    match &api.file_specs[0] {
        FileSpec::Templated(spec) => {
            assert!(matches!(spec.dest_path, Some(DestPath::Rendered(_))))
        }
        other => panic!("Expected templated spec, got {other:?}"),
    }
}

#[test]
fn test_loaded_rules_plan() {
    let renderer = MiniJinjaRenderer::new();
    let table = parse_rules(RULES, &renderer).unwrap();
    let store = MemoryTemplateStore::new();
    let generator = Generator::new(&table, &store, &renderer);

    let ctx = GeneratorContext::new()
        .with("applicationType", "microservice")
        .with("javaDir", "com/acme")
        .with("baseName", "shop");
    let plan = generator.plan(&ctx).unwrap();
    let dests: Vec<PathBuf> = plan.into_iter().map(|file| file.dest_path).collect();

    assert_eq!(
        dests,
        vec![
            PathBuf::from("checkstyle.xml"),
            PathBuf::from("api/src/main/java/com/acme/shop/Sample.java"),
            PathBuf::from("api/.gitignore"),
        ]
    );
}

#[test]
fn test_schema_violations_are_reported() {
    let renderer = MiniJinjaRenderer::new();

    let unknown_key = "group:\n  - fileSpecs: [a.txt]\n    when: yes\n";
    assert!(matches!(parse_rules(unknown_key, &renderer), Err(Error::RuleTableError(_))));

    let bad_mode = "group:\n  - fileSpecs:\n      - sourceId: a.txt\n        mode: render\n";
    assert!(matches!(parse_rules(bad_mode, &renderer), Err(Error::RuleTableError(_))));

    let empty_source = "group:\n  - fileSpecs: ['']\n";
    assert!(matches!(parse_rules(empty_source, &renderer), Err(Error::RuleTableError(_))));

    assert!(matches!(parse_rules("", &renderer), Err(Error::RuleTableError(_))));
}

#[test]
fn test_invalid_expressions_are_rejected_at_load() {
    let renderer = MiniJinjaRenderer::new();

    let bad_condition = "group:\n  - condition: \"buildTool ==\"\n    fileSpecs: [a.txt]\n";
    let err = parse_rules(bad_condition, &renderer).unwrap_err();
    assert!(err.to_string().contains("group[0]"));

    let bad_template =
        "group:\n  - fileSpecs:\n      - sourceId: a.txt\n        destPath: { computed: \"{{ x\" }\n";
    assert!(matches!(parse_rules(bad_template, &renderer), Err(Error::RuleTableError(_))));

    let bad_pattern = "group:\n  - fileSpecs:\n      - sourceId: a.txt\n        options: { interpolatePattern: \"@@\\\\w+@@\" }\n";
    assert!(parse_rules(bad_pattern, &renderer).is_err());
}

#[test]
fn test_load_rules_from_json_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("rules.json");
    std::fs::write(
        &path,
        r#"{"serverBuild": [{"condition": "buildTool == 'gradle'", "fileSpecs": ["build.gradle"]}]}"#,
    )
    .unwrap();

    let table = load_rules(&path, &MiniJinjaRenderer::new()).unwrap();
    assert_eq!(table.groups.len(), 1);
    assert_eq!(table.groups[0].blocks[0].file_specs[0].source_id(), "build.gradle");

    assert!(load_rules(temp_dir.path().join("missing.yml"), &MiniJinjaRenderer::new()).is_err());
}
