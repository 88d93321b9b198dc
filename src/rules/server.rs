//! Built-in rule table for server projects.
//!
//! Microservice sources are stored under a neutral `package/` directory and
//! relocated into `<javaDir>/<baseName>/` by their rename functions.

use super::{FileSpec, InterpolatePattern, RuleBlock, RuleGroup, RuleTable};
use crate::context::GeneratorContext;
use crate::error::Result;

fn is_microservice(ctx: &GeneratorContext) -> Result<bool> {
    Ok(ctx.is("applicationType", "microservice"))
}

fn package_path(ctx: &GeneratorContext, tree: &str, tail: &str) -> Result<String> {
    let java_dir = ctx.get_str("javaDir")?.trim_end_matches('/');
    let base_name = ctx.get_str("baseName")?;
    Ok(format!("src/{tree}/java/{java_dir}/{base_name}/{tail}"))
}

fn main_java(ctx: &GeneratorContext, tail: &str) -> Result<String> {
    package_path(ctx, "main", tail)
}

fn test_java(ctx: &GeneratorContext, tail: &str) -> Result<String> {
    package_path(ctx, "test", tail)
}

fn server_build() -> RuleGroup {
    RuleGroup::new(
        "serverBuild",
        vec![
            RuleBlock::new().files([
                FileSpec::from("checkstyle.xml").with_pattern(InterpolatePattern::Escaped)
            ]),
            RuleBlock::new().when(|ctx| Ok(ctx.is("buildTool", "gradle"))).files([
                FileSpec::from("build.gradle"),
                FileSpec::from("settings.gradle"),
                FileSpec::from("shared.gradle"),
                FileSpec::copy_text("gradlew"),
                FileSpec::copy_text("gradlew.bat"),
                FileSpec::copy_binary("gradle/wrapper/gradle-wrapper.jar"),
                FileSpec::from("gradle/wrapper/gradle-wrapper.properties"),
            ]),
        ],
    )
}

fn microservice_api() -> RuleBlock {
    RuleBlock::new().when(is_microservice).base_path("api/").files([
        FileSpec::from("build.gradle"),
        FileSpec::from("settings.gradle"),
        FileSpec::templated("src/main/java/package/api/v1/client/IamATeapotException.java")
            .rename_to(|ctx| main_java(ctx, "api/v1/client/IamATeapotException.java")),
        FileSpec::templated("src/main/java/package/api/v1/client/TemplateManager.java")
            .rename_to(|ctx| main_java(ctx, "api/v1/client/TemplateManager.java")),
        FileSpec::templated("src/main/java/package/api/v1/domain/Sample.java")
            .rename_to(|ctx| main_java(ctx, "api/v1/domain/Sample.java")),
        FileSpec::templated("src/main/java/package/api/v1/events/EventConstants.java")
            .rename_to(|ctx| main_java(ctx, "api/v1/events/EventConstants.java")),
        FileSpec::templated("src/main/java/package/api/v1/PermittableGroupIds.java")
            .rename_to(|ctx| main_java(ctx, "api/v1/PermittableGroupIds.java")),
        FileSpec::templated("src/test/java/package/api/v1/domain/SampleTest.java")
            .rename_to(|ctx| test_java(ctx, "api/v1/domain/SampleTest.java")),
    ])
}

fn microservice_component_test() -> RuleBlock {
    RuleBlock::new().when(is_microservice).base_path("component-test/").files([
        FileSpec::from("build.gradle"),
        FileSpec::from("settings.gradle"),
        FileSpec::templated("src/main/java/package/TestSuite.java")
            .rename_to(|ctx| main_java(ctx, "TestSuite.java")),
        FileSpec::templated("src/main/java/package/TestSample.java")
            .rename_to(|ctx| main_java(ctx, "TestSample.java")),
        FileSpec::templated("src/main/java/package/SuiteTestEnvironment.java")
            .rename_to(|ctx| main_java(ctx, "SuiteTestEnvironment.java")),
        FileSpec::templated("src/main/java/package/listener/MigrationEventListener.java")
            .rename_to(|ctx| main_java(ctx, "listener/MigrationEventListener.java")),
        FileSpec::templated("src/main/java/package/listener/SampleEventListener.java")
            .rename_to(|ctx| main_java(ctx, "listener/SampleEventListener.java")),
    ])
}

fn microservice_service() -> RuleBlock {
    RuleBlock::new().when(is_microservice).base_path("service/").files([
        FileSpec::from("build.gradle"),
        FileSpec::from("settings.gradle"),
        FileSpec::from("src/main/resources/db/migrations/postgresql/V1__initial_setup.sql"),
        FileSpec::from("src/main/resources/application.yml"),
        FileSpec::from("src/main/resources/bootstrap.yml"),
        FileSpec::templated("src/main/java/package/service/ServiceConstants.java")
            .rename_to(|ctx| main_java(ctx, "service/ServiceConstants.java")),
        FileSpec::templated("src/main/java/package/service/TemplateApplication.java")
            .rename_to(|ctx| main_java(ctx, "service/TemplateApplication.java")),
        FileSpec::templated("src/main/java/package/service/TemplateConfiguration.java")
            .rename_to(|ctx| main_java(ctx, "service/TemplateConfiguration.java")),
        FileSpec::templated(
            "src/main/java/package/service/internal/command/InitializeServiceCommand.java",
        )
        .rename_to(|ctx| main_java(ctx, "service/internal/InitializeServiceCommand.java")),
        FileSpec::templated("src/main/java/package/service/internal/command/SampleCommand.java")
            .rename_to(|ctx| main_java(ctx, "service/internal/SampleCommand.java")),
        FileSpec::templated(
            "src/main/java/package/service/internal/command/handler/MigrationAggregate.java",
        )
        .rename_to(|ctx| main_java(ctx, "service/internal/handler/MigrationAggregate.java")),
        FileSpec::templated(
            "src/main/java/package/service/internal/command/handler/SampleAggregate.java",
        )
        .rename_to(|ctx| main_java(ctx, "service/internal/handler/SampleAggregate.java")),
        // Target name differs from the source (Sampler vs Sample); kept as authored.
        FileSpec::templated("src/main/java/package/service/internal/mapper/SampleMapper.java")
            .rename_to(|ctx| main_java(ctx, "service/internal/mapper/SamplerMapper.java")),
        FileSpec::templated(
            "src/main/java/package/service/internal/repository/SampleJpaEntity.java",
        )
        .rename_to(|ctx| main_java(ctx, "service/internal/repository/SampleJpaEntity.java")),
        FileSpec::templated(
            "src/main/java/package/service/internal/repository/SampleJpaEntityRepository.java",
        )
        .rename_to(|ctx| {
            main_java(ctx, "service/internal/repository/SampleJpaEntityRepository.java")
        }),
        FileSpec::templated("src/main/java/package/service/internal/service/SampleService.java")
            .rename_to(|ctx| main_java(ctx, "service/internal/service/SampleService.java")),
        FileSpec::templated("src/main/java/package/service/rest/SampleRestController.java")
            .rename_to(|ctx| main_java(ctx, "service/rest/SampleRestController.java")),
    ])
}

/// The complete server table: `serverBuild` then `serverMicroservice`.
pub fn server_rules() -> RuleTable {
    RuleTable::new(vec![
        server_build(),
        RuleGroup::new(
            "serverMicroservice",
            vec![microservice_api(), microservice_component_test(), microservice_service()],
        ),
    ])
}
