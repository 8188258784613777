use ghostwriter_transcript::{ChapterExporter, TranscriptEvent, TranscriptLog};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

#[tokio::test]
async fn export_writes_chapters_and_raw_log() {
    let dir = TempDir::new().unwrap();
    let log = TranscriptLog::new(dir.path().join("transcript.ndjson"));
    for event in [
        TranscriptEvent::command("look"),
        TranscriptEvent::narration("You are in a room.", Vec::new()),
        TranscriptEvent::chapter_break("---"),
        TranscriptEvent::command("north"),
        TranscriptEvent::narration("A corridor stretches ahead.", Vec::new()),
    ] {
        log.append(&event).await.unwrap();
    }
    std::fs::write(dir.path().join("story.md"), "story").unwrap();

    let exporter = ChapterExporter::new(
        log,
        dir.path().join("story.md"),
        dir.path().join("chapters.md"),
    )
    .with_steps_per_chapter(2);
    let out = exporter.export().await.unwrap();

    let content = std::fs::read_to_string(&out).unwrap();
    assert_eq!(
        content,
        "# Chapter 1\n\n> look\n\nYou are in a room.\n\n# Chapter 2\n\n> north\n\nA corridor stretches ahead.\n\n---\n\n# Raw Story Log\n\nstory"
    );
}

#[tokio::test]
async fn export_without_transcript_is_placeholder_only() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("story.md"), "orphaned story").unwrap();

    let out = ChapterExporter::new(
        TranscriptLog::new(dir.path().join("transcript.ndjson")),
        dir.path().join("story.md"),
        dir.path().join("chapters.md"),
    )
    .export()
    .await
    .unwrap();

    assert_eq!(
        std::fs::read_to_string(out).unwrap(),
        "# Chapter 1\n\n(Empty)"
    );
}

#[tokio::test]
async fn export_survives_corrupt_lines() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("transcript.ndjson");
    let good = serde_json::to_string(&TranscriptEvent::command("wait")).unwrap();
    std::fs::write(&path, format!("not json\n{good}\n{{\"half\":\n")).unwrap();

    let out = ChapterExporter::new(
        TranscriptLog::new(&path),
        dir.path().join("story.md"),
        dir.path().join("chapters.md"),
    )
    .export()
    .await
    .unwrap();

    assert_eq!(
        std::fs::read_to_string(out).unwrap(),
        "# Chapter 1\n\n> wait"
    );
}
