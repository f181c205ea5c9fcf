use texcube::runner::Runner;
use texcube::types::FailureStage;

use super::{entries, fixture_source, test_config};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires pdflatex"]
async fn test_concurrent_mixed_requests() {
    let scratch = tempfile::tempdir().unwrap();
    let mut config = test_config(scratch.path());
    config.max_concurrent = 3;
    let runner = Runner::new(config);

    let mut handles = Vec::new();
    for i in 0..8 {
        let runner = runner.clone();
        handles.push(tokio::spawn(async move {
            let fixture = if i % 2 == 0 {
                "hello.tex"
            } else {
                "undefined_command.tex"
            };
            let outcome = runner
                .compile_source(&fixture_source(fixture), None)
                .await
                .expect("Compilation call failed");
            (fixture, outcome)
        }));
    }

    for handle in handles {
        let (fixture, outcome) = handle.await.unwrap();
        if fixture == "hello.tex" {
            assert!(outcome.artifact().expect("expected a PDF").is_pdf());
        } else {
            assert_eq!(outcome.stage(), Some(FailureStage::Rejected));
        }
    }

    assert_eq!(entries(scratch.path()), 0);
    assert_eq!(runner.workspaces().available(), 3);
}
