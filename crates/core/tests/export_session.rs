use std::fs;

use tempfile::tempdir;
use voyagelog_core::{DraftStore, EditorSession, LogEntry, LogPreview};
use voyagelog_printing::{CaptureExporter, CaptureSpec, DirectorySink, RenderTarget};
use voyagelog_settings::{JsonFileStore, Preferences};

fn long_body(lines: usize) -> String {
    (1..=lines)
        .map(|n| format!("Day {n}: calm seas and a steady wind out of the west."))
        .collect::<Vec<_>>()
        .join("\n")
}

fn small_spec() -> CaptureSpec {
    CaptureSpec {
        width_px: 102,
        height_px: 132,
        scale: 2,
    }
}

#[tokio::test(start_paused = true)]
async fn session_pages_export_as_images() {
    let dir = tempdir().expect("tempdir");
    let mut session = EditorSession::default();
    session.set_title("Harbor Watch");
    session.set_body(long_body(90));
    assert_eq!(session.pages().len(), 3);
    session.set_active_page(1);

    let mut preview = LogPreview::from_session(&session, &Preferences::default());
    let exporter = CaptureExporter::new(DirectorySink::new(dir.path()), session.entry().title.clone())
        .with_capture_spec(small_spec());

    let report = exporter.export_images(session.pages(), &mut preview).await;

    assert!(report.is_complete());
    assert_eq!(preview.active_page(), 1);
    for number in 1..=3 {
        let path = dir.path().join(format!("Harbor-Watch_page{number}.png"));
        let image = image::open(&path).expect("exported page");
        assert_eq!((image.width(), image.height()), (204, 264));
    }
}

#[tokio::test(start_paused = true)]
async fn untitled_log_exports_pdf_pages() {
    let dir = tempdir().expect("tempdir");
    let session = EditorSession::new(LogEntry {
        body: long_body(50),
        ..LogEntry::default()
    });
    let mut preview = LogPreview::from_session(&session, &Preferences::default());
    let exporter = CaptureExporter::new(DirectorySink::new(dir.path()), "")
        .with_capture_spec(small_spec());

    let report = exporter.export_paged(session.pages(), &mut preview).await;

    assert_eq!(
        report.file_names(),
        vec!["Voyage_Log_page1.pdf", "Voyage_Log_page2.pdf"]
    );
    let pdf = fs::read(dir.path().join("Voyage_Log_page2.pdf")).expect("pdf");
    assert!(pdf.starts_with(b"%PDF-1.4"));
}

#[test]
fn draft_survives_reopening_the_workspace() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join(".voyagelog").join("draft.json");

    let mut session = EditorSession::default();
    session.load_testing_data();
    session.add_new_dive();
    {
        let mut drafts = DraftStore::new(JsonFileStore::open(&path).expect("open"));
        drafts.save(session.entry()).expect("save");
    }

    let drafts = DraftStore::new(JsonFileStore::open(&path).expect("reopen"));
    let restored = drafts.load().expect("load");
    assert_eq!(&restored, session.entry());

    let reopened = EditorSession::new(restored);
    assert_eq!(reopened.pages().len(), 1);
    assert_eq!(reopened.active_page(), 0);
}
