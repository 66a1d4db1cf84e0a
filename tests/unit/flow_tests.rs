use sharecloud::application::download::CONTENT_UNAVAILABLE_MESSAGE;
use sharecloud::application::{
    download, Confirmation, DownloadOutcome, MetadataStore, SelectedFile, UploadError,
    UploadFlow, UploadSettings, UploadState,
};
use sharecloud::domain::{FileRecord, PersistedFile};
use sharecloud::infrastructure::storage::MemoryStorage;
use std::sync::Mutex;
use std::time::Duration;

fn settings(delay_ms: u64, tick_ms: u64) -> UploadSettings {
    UploadSettings {
        delay: Duration::from_millis(delay_ms),
        tick: Duration::from_millis(tick_ms),
        max_bytes: 4096,
        public_url: "http://share.test/".to_string(),
    }
}

fn report() -> SelectedFile {
    SelectedFile {
        name: "report.pdf".to_string(),
        media_type: Some("application/pdf".to_string()),
        bytes: vec![0x25; 2048],
    }
}

fn empty_store() -> Mutex<MetadataStore> {
    Mutex::new(MetadataStore::load(Box::new(MemoryStorage::new())))
}

async fn upload_into(
    store: &Mutex<MetadataStore>,
    flow: &UploadFlow,
    file: SelectedFile,
) -> Result<FileRecord, UploadError> {
    flow.execute(file, |build| {
        let mut store = store.lock().unwrap();
        let id = store.next_id();
        let record = build(&id);
        store.upload(record.clone());
        Ok(record)
    })
    .await
}

#[cfg(test)]
mod upload_flow_tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_submission_waits_for_simulated_delay() {
        let store = empty_store();
        let flow = UploadFlow::new(settings(1500, 150));
        assert_eq!(flow.state(), UploadState::Idle);

        let started = tokio::time::Instant::now();
        let record = upload_into(&store, &flow, report()).await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(1500));
        assert_eq!(
            flow.state(),
            UploadState::Completed {
                id: record.id.clone(),
                share_url: format!("http://share.test/file/{}", record.id),
            }
        );
        assert!(store.lock().unwrap().contains(&record.id));
    }

    #[tokio::test(start_paused = true)]
    async fn test_progress_is_monotonic_and_capped() {
        let store = empty_store();
        let flow = UploadFlow::new(settings(3000, 150));
        let mut updates = flow.subscribe();

        let watcher = tokio::spawn(async move {
            let mut seen = Vec::new();
            while updates.changed().await.is_ok() {
                let state = updates.borrow_and_update().clone();
                let done = matches!(state, UploadState::Completed { .. });
                seen.push(state);
                if done {
                    break;
                }
            }
            seen
        });

        upload_into(&store, &flow, report()).await.unwrap();
        let seen = watcher.await.unwrap();

        let progress: Vec<u8> = seen
            .iter()
            .filter_map(|s| match s {
                UploadState::Uploading { progress } => Some(*progress),
                _ => None,
            })
            .collect();

        assert!(progress.windows(2).all(|w| w[0] <= w[1]));
        assert!(progress.iter().all(|p| *p <= 100));
        assert_eq!(progress.last(), Some(&100));
        assert!(matches!(seen.last(), Some(UploadState::Completed { .. })));
    }

    #[tokio::test]
    async fn test_record_fields_match_selection() {
        let store = empty_store();
        let flow = UploadFlow::new(settings(0, 0));

        let record = upload_into(&store, &flow, report()).await.unwrap();

        assert_eq!(record.original_name, "report.pdf");
        assert_eq!(record.size, 2048);
        assert_eq!(record.media_type, "application/pdf");
        assert_eq!(record.download_count, 0);
        assert_eq!(record.id.len(), 8);
        assert!(record.has_content());
    }

    #[tokio::test]
    async fn test_empty_filename_is_rejected_before_delay() {
        let store = empty_store();
        let flow = UploadFlow::new(settings(0, 0));
        let mut file = report();
        file.name = "   ".to_string();

        let result = upload_into(&store, &flow, file).await;

        assert!(matches!(result, Err(UploadError::EmptyFilename)));
        assert!(store.lock().unwrap().is_empty());
        assert_eq!(flow.state(), UploadState::Idle);
    }

    #[tokio::test]
    async fn test_oversized_file_is_rejected() {
        let store = empty_store();
        let flow = UploadFlow::new(settings(0, 0));
        let mut file = report();
        file.bytes = vec![0; 4097];

        let result = upload_into(&store, &flow, file).await;

        assert!(matches!(
            result,
            Err(UploadError::TooLarge { size: 4097, max: 4096 })
        ));
        assert!(store.lock().unwrap().is_empty());
    }
}

#[cfg(test)]
mod download_flow_tests {
    use super::*;

    #[test]
    fn test_unknown_id_is_not_found_without_mutation() {
        let mut store = MetadataStore::load(Box::new(MemoryStorage::new()));
        store.upload(FileRecord::new("known", "a.txt", None, b"a"));
        let before = store.projection();

        assert_eq!(download(&mut store, "unknown-id"), DownloadOutcome::NotFound);
        assert_eq!(store.projection(), before);
    }

    #[test]
    fn test_download_returns_original_bytes_and_counts_once() {
        let mut store = MetadataStore::load(Box::new(MemoryStorage::new()));
        store.upload(FileRecord::new("abc", "hello.txt", Some("text/plain"), b"hello world"));

        match download(&mut store, "abc") {
            DownloadOutcome::Ready { record, payload } => {
                assert_eq!(record.download_count, 1);
                assert_eq!(payload.bytes, b"hello world");
                assert_eq!(payload.file_name, "hello.txt");
                assert_eq!(payload.media_type, "text/plain");
                assert_eq!(
                    payload.digest,
                    "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
                );
            }
            other => panic!("Expected Ready, got {:?}", other),
        }

        assert_eq!(store.get("abc").unwrap().download_count, 1);
    }

    #[test]
    fn test_detached_content_explains_and_still_counts() {
        let original = FileRecord::new("abc", "lost.bin", None, b"gone after restart");
        let mut store = MetadataStore::load(Box::new(MemoryStorage::new()));
        store.upload(FileRecord::from(PersistedFile::from(&original)));

        match download(&mut store, "abc") {
            DownloadOutcome::Unavailable { record, message } => {
                assert_eq!(record.download_count, 1);
                assert_eq!(message, CONTENT_UNAVAILABLE_MESSAGE);
            }
            other => panic!("Expected Unavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_report_scenario() {
        let store = empty_store();
        let flow = UploadFlow::new(settings(0, 0));

        let record = upload_into(&store, &flow, report()).await.unwrap();
        assert_eq!(record.download_count, 0);

        let mut store = store.into_inner().unwrap();
        assert!(matches!(
            download(&mut store, &record.id),
            DownloadOutcome::Ready { .. }
        ));
        assert_eq!(store.get(&record.id).unwrap().download_count, 1);

        store.delete(&record.id, Confirmation::Confirmed);
        assert!(store.get(&record.id).is_none());
    }
}
