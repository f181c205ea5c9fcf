use texcube::runner::Runner;
use texcube::types::{CompilationOutcome, ErrorClass, FailureStage};

use super::{entries, fixture_source, test_config};

#[tokio::test]
#[ignore = "requires pdflatex"]
async fn test_compile_hello_success() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = Runner::new(test_config(scratch.path()));

    let outcome = runner
        .compile_source(&fixture_source("hello.tex"), Some("pdflatex"))
        .await
        .expect("Compilation call failed");

    let artifact = outcome.artifact().expect("expected a PDF");
    assert!(artifact.is_pdf());
    assert_eq!(artifact.filename, "output.pdf");
    assert_eq!(artifact.content_type, "application/pdf");
    assert_eq!(entries(scratch.path()), 0);
}

#[tokio::test]
#[ignore = "requires pdflatex"]
async fn test_compile_unicode_source() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = Runner::new(test_config(scratch.path()));

    let outcome = runner
        .compile_source(&fixture_source("unicode.tex"), None)
        .await
        .expect("Compilation call failed");

    assert!(outcome.is_success(), "unexpected outcome: {outcome:?}");
}

#[tokio::test]
#[ignore = "requires pdflatex"]
async fn test_compile_forward_reference() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = Runner::new(test_config(scratch.path()));

    let outcome = runner
        .compile_source(&fixture_source("forward_reference.tex"), None)
        .await
        .expect("Compilation call failed");

    assert!(outcome.is_success(), "unexpected outcome: {outcome:?}");
    assert!(outcome.artifact().unwrap().is_pdf());
}

#[tokio::test]
#[ignore = "requires pdflatex"]
async fn test_compile_undefined_command_rejected() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = Runner::new(test_config(scratch.path()));

    let outcome = runner
        .compile_source(&fixture_source("undefined_command.tex"), None)
        .await
        .expect("Compilation call failed");

    assert_eq!(outcome.stage(), Some(FailureStage::Rejected));
    let diagnostic = outcome.diagnostic().unwrap();
    assert!(diagnostic.contains("Undefined control sequence"));

    let report = outcome.report().unwrap();
    assert_eq!(report.class, ErrorClass::Compilation);
    assert_eq!(report.error, "document failed to compile");
    assert_eq!(entries(scratch.path()), 0);
}

#[tokio::test]
#[ignore = "requires pdflatex"]
async fn test_compile_empty_document_has_no_artifact() {
    let scratch = tempfile::tempdir().unwrap();
    let runner = Runner::new(test_config(scratch.path()));

    let outcome = runner
        .compile_source(&fixture_source("no_output.tex"), None)
        .await
        .expect("Compilation call failed");

    assert_eq!(outcome.stage(), Some(FailureStage::ArtifactMissing));
    assert!(outcome.diagnostic().unwrap().contains("No pages of output"));
}

#[tokio::test]
#[ignore = "requires pdflatex"]
async fn test_compile_infinite_loop_times_out() {
    let scratch = tempfile::tempdir().unwrap();
    let config = test_config(scratch.path());
    let engine = config.get_engine("pdflatex").unwrap().clone().with_timeout(2.0);
    let runner = Runner::new(config);

    let started = std::time::Instant::now();
    let outcome = runner
        .compile_source_with(&fixture_source("infinite_loop.tex"), &engine)
        .await
        .expect("Compilation call failed");

    assert_eq!(outcome.stage(), Some(FailureStage::Timeout));
    match outcome {
        CompilationOutcome::Failure { passes_run, .. } => assert_eq!(passes_run, 1),
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(started.elapsed() < std::time::Duration::from_secs(10));
    assert_eq!(entries(scratch.path()), 0);
}

#[tokio::test]
async fn test_compile_missing_engine_launch_failure() {
    let scratch = tempfile::tempdir().unwrap();
    let config = test_config(scratch.path());
    let engine =
        texcube::Engine::new("Missing", "texcube-no-such-engine").with_path("/nonexistent");
    let runner = Runner::new(config);

    let outcome = runner
        .compile_source_with(&fixture_source("hello.tex"), &engine)
        .await
        .expect("Compilation call failed");

    assert_eq!(outcome.stage(), Some(FailureStage::LaunchFailed));
    assert_eq!(outcome.report().unwrap().class, ErrorClass::Infrastructure);
    assert_eq!(entries(scratch.path()), 0);
}
