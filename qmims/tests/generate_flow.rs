//! End-to-end `generate` scenarios driven by scripted shell workers.
//!
//! Each test builds a throwaway project, swaps the real worker for a small
//! `sh -c` script, and checks what the "worker" wrote: the README itself and
//! the prompt it received as its final argument.

#![cfg(unix)]

use qmims::core::mode::Mode;
use qmims::generate::{GenerateOutcome, run_generate};
use qmims::io::config::QmimsConfig;
use qmims::io::session::SessionError;
use qmims::test_support::{TestProject, recording_worker, script_worker};

fn config_with(worker: qmims::io::config::WorkerConfig) -> QmimsConfig {
    QmimsConfig {
        worker,
        ..QmimsConfig::default()
    }
}

/// Instruct mode: directives are scanned from the README, their target text is
/// extracted, and the worker receives both in its prompt.
#[test]
fn instruct_mode_sends_instructions_and_targets() {
    let project = TestProject::new().expect("project");
    project
        .write(
            "README.md",
            "# Widget\n\
\n\
<!-- qmims: Rewrite the introduction for new users -->\n\
<!-- qmims-target-start -->\n\
Widget does things.\n\
<!-- qmims-target-end -->\n\
\n\
<!-- qmims: Expand the install steps -->\n\
cargo install widget\n",
        )
        .expect("write readme");
    let prompt_file = project.path().join(".prompt");
    let config = config_with(recording_worker(&prompt_file, "README.md", "# Widget\n\nRewritten.\n"));

    let outcome = run_generate(
        &project.request(Mode::Instruct(None)),
        &config,
        &project.templates(),
    )
    .expect("generate");

    assert_eq!(
        outcome,
        GenerateOutcome::Completed {
            readme: project.path().join("README.md"),
            mode: Mode::Instruct(None),
        }
    );
    assert_eq!(project.read("README.md").expect("read"), "# Widget\n\nRewritten.\n");

    let prompt = project.read(".prompt").expect("prompt");
    assert!(prompt.contains("Rewrite the introduction for new users"));
    assert!(prompt.contains("```markdown\nWidget does things.\n```"));
    assert!(prompt.contains("Expand the install steps"));
    assert!(prompt.contains("```markdown\ncargo install widget\n```"));
}

/// Instruct mode with a separate instruction file still targets the README.
#[test]
fn instruct_mode_reads_instruction_file() {
    let project = TestProject::new().expect("project");
    project
        .write("docs/plan.md", "<!-- qmims: Add a badges row -->\n")
        .expect("write plan");
    let prompt_file = project.path().join(".prompt");
    let config = config_with(recording_worker(&prompt_file, "README.md", "# New\n"));

    run_generate(
        &project.request("instruct:docs/plan.md".parse().expect("mode")),
        &config,
        &project.templates(),
    )
    .expect("generate");

    let prompt = project.read(".prompt").expect("prompt");
    assert!(prompt.contains("Add a badges row"));
    assert!(prompt.contains("docs/plan.md"));
    assert_eq!(project.read("README.md").expect("read"), "# New\n");
}

/// Template mode falls back to the configured default template name.
#[test]
fn template_mode_uses_default_template() {
    let project = TestProject::new().expect("project");
    let prompt_file = project.path().join(".prompt");
    let mut config = config_with(recording_worker(&prompt_file, "README.md", "# T\n"));
    config.default_template = "minimal".to_string();

    let outcome = run_generate(
        &project.request(Mode::Template(None)),
        &config,
        &project.templates(),
    )
    .expect("generate");

    assert_eq!(
        outcome,
        GenerateOutcome::Completed {
            readme: project.path().join("README.md"),
            mode: Mode::Template(Some("minimal".to_string())),
        }
    );
    let prompt = project.read(".prompt").expect("prompt");
    assert!(prompt.contains("--- template: minimal ---"));
}

/// Auto-approve from config allows replacing an existing README.
#[test]
fn auto_mode_overwrites_when_approved() {
    let project = TestProject::new().expect("project");
    project.write("README.md", "# Old\n").expect("write");
    let prompt_file = project.path().join(".prompt");
    let mut config = config_with(recording_worker(&prompt_file, "README.md", "# Fresh\n"));
    config.auto_approve = true;

    run_generate(&project.request(Mode::Auto), &config, &project.templates()).expect("generate");

    assert_eq!(project.read("README.md").expect("read"), "# Fresh\n");
    let prompt = project.read(".prompt").expect("prompt");
    assert!(prompt.contains("Replace it entirely"));
}

/// A failing worker surfaces its exit code through the error chain.
#[test]
fn worker_failure_carries_exit_code() {
    let project = TestProject::new().expect("project");
    let config = config_with(script_worker("exit 2"));

    let err = run_generate(&project.request(Mode::Auto), &config, &project.templates())
        .unwrap_err();

    let session_err = err
        .downcast_ref::<SessionError>()
        .expect("session error in chain");
    assert_eq!(session_err.exit_code(), Some(2));
    assert!(format!("{err:#}").contains("exit code 2"));
}
