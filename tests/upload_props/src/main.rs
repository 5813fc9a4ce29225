fn main() {
    println!("Run `cargo test -p upload-props` to execute upload engine property tests.");
}

#[cfg(test)]
mod tests {
    //! Cross-crate properties of the chunked-upload engine.
    //!
    //! Everything here runs against `MemoryStore` with sizes scaled down to a
    //! 4-byte chunk, which keeps the call-count arithmetic identical to the
    //! production 4 MiB chunk without megabytes of fixture data.

    use std::path::PathBuf;
    use std::time::Duration;

    use snapvault_remote::{MemoryStore, Op, RemoteStore, StoreError};
    use snapvault_transfer::{ChunkReader, content_hash_file};
    use snapvault_uploader::{Presence, RetryPolicy, UploadOutcome, Uploader, evaluate};
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    const CHUNK: usize = 4;

    fn snapshot(dir: &TempDir, name: &str, data: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, data).unwrap();
        path
    }

    fn fast_retry() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 4,
            initial_delay: Duration::from_millis(1),
            backoff_factor: 1.0,
            max_delay: Duration::from_millis(1),
        }
    }

    fn uploader(store: &MemoryStore) -> Uploader<'_> {
        Uploader::new(store).with_chunk_size(CHUNK).with_retry(fast_retry())
    }

    fn events() -> mpsc::Sender<snapvault_uploader::UploadEvent> {
        mpsc::channel(256).0
    }

    #[tokio::test]
    async fn upload_then_evaluate_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let path = snapshot(&dir, "s.tar", b"some snapshot archive bytes");
        let store = MemoryStore::new();

        assert_eq!(evaluate(&store, &path, "/b/s.tar").await.unwrap(), Presence::Absent);

        let outcome = uploader(&store).upload(&path, "/b/s.tar", &events()).await;
        assert!(matches!(outcome, UploadOutcome::Uploaded { .. }));

        // Unchanged bytes: present now, and a second upload skips.
        assert_eq!(evaluate(&store, &path, "/b/s.tar").await.unwrap(), Presence::Present);
        let outcome = uploader(&store).upload(&path, "/b/s.tar", &events()).await;
        assert!(matches!(outcome, UploadOutcome::Skipped { .. }));
    }

    #[tokio::test]
    async fn hash_ignores_file_metadata() {
        let dir = TempDir::new().unwrap();
        let a = snapshot(&dir, "first-name.tar", b"identical content");
        let b = snapshot(&dir, "second-name.tar", b"identical content");

        let ha = content_hash_file(&a).unwrap();
        assert_eq!(ha, content_hash_file(&a).unwrap());
        assert_eq!(ha, content_hash_file(&b).unwrap());
    }

    #[tokio::test]
    async fn chunking_is_complete_and_exact() {
        let dir = TempDir::new().unwrap();
        for size in [1usize, CHUNK - 1, CHUNK, CHUNK + 1, 3 * CHUNK, 3 * CHUNK + 2] {
            let path = snapshot(&dir, &format!("{size}.tar"), &vec![0x42; size]);
            let mut reader = ChunkReader::new(&path, CHUNK).unwrap();

            let mut count = 0;
            let mut total = 0;
            while let Some(chunk) = reader.next_chunk().unwrap() {
                count += 1;
                total += chunk.len();
            }
            assert_eq!(total, size, "chunks must cover the file exactly");
            assert_eq!(count, size.div_ceil(CHUNK), "ceil(S / chunk) chunks");
        }
    }

    #[tokio::test]
    async fn small_file_never_opens_a_session() {
        let dir = TempDir::new().unwrap();
        let path = snapshot(&dir, "s.tar", &vec![1u8; CHUNK]);
        let store = MemoryStore::new();

        uploader(&store).upload(&path, "/b/s.tar", &events()).await;

        assert_eq!(store.calls(Op::PutSmall), 1);
        assert_eq!(store.calls(Op::SessionStart), 0);
        assert_eq!(store.calls(Op::SessionAppend), 0);
        assert_eq!(store.calls(Op::SessionFinish), 0);
    }

    #[tokio::test]
    async fn chunk_plus_one_byte_is_two_chunks() {
        let dir = TempDir::new().unwrap();
        let path = snapshot(&dir, "s.tar", &vec![1u8; CHUNK + 1]);
        let store = MemoryStore::new();

        uploader(&store).upload(&path, "/b/s.tar", &events()).await;

        assert_eq!(store.calls(Op::SessionStart), 1);
        assert_eq!(store.calls(Op::SessionAppend), 0);
        assert_eq!(store.calls(Op::SessionFinish), 1);
        assert_eq!(store.object("/b/s.tar").unwrap().len(), CHUNK + 1);
    }

    #[tokio::test]
    async fn always_transient_makes_exactly_four_attempts() {
        let dir = TempDir::new().unwrap();
        let path = snapshot(&dir, "s.tar", b"xy");
        let store = MemoryStore::new();
        for _ in 0..100 {
            store.inject_fault(Op::PutSmall, StoreError::Transient("flaky".into()));
        }

        let outcome = uploader(&store).upload(&path, "/b/s.tar", &events()).await;
        assert!(matches!(outcome, UploadOutcome::Failed { .. }));
        assert_eq!(store.calls(Op::PutSmall), 4, "never fewer, never more");
    }

    #[tokio::test]
    async fn fatal_error_consumes_no_retry_budget() {
        let dir = TempDir::new().unwrap();
        let path = snapshot(&dir, "s.tar", &vec![1u8; 3 * CHUNK]);
        let store = MemoryStore::new();
        store.inject_fault(Op::SessionAppend, StoreError::Fatal("invalid path".into()));

        let outcome = uploader(&store).upload(&path, "/b/s.tar", &events()).await;
        assert!(matches!(outcome, UploadOutcome::Failed { .. }));
        assert_eq!(store.calls(Op::SessionStart), 1, "no further attempts");
    }

    #[tokio::test]
    async fn conflict_deletes_once_and_reuploads() {
        let dir = TempDir::new().unwrap();
        let path = snapshot(&dir, "s.tar", b"local Y content");
        let store = MemoryStore::new();
        store.insert_object("/b/s.tar", b"remote X content".to_vec());

        assert_eq!(evaluate(&store, &path, "/b/s.tar").await.unwrap(), Presence::Absent);
        assert_eq!(store.calls(Op::Delete), 1);

        let outcome = uploader(&store).upload(&path, "/b/s.tar", &events()).await;
        assert!(matches!(outcome, UploadOutcome::Uploaded { .. }));
        assert_eq!(store.object("/b/s.tar").unwrap(), b"local Y content");
    }

    #[tokio::test]
    async fn failed_finish_leaves_destination_not_found() {
        let dir = TempDir::new().unwrap();
        let path = snapshot(&dir, "s.tar", &vec![1u8; 2 * CHUNK + 1]);
        let store = MemoryStore::new();
        // Every finish fails: all four attempts run the session to the end and
        // abort at the last call.
        for _ in 0..4 {
            store.inject_fault(Op::SessionFinish, StoreError::Transient("flaky".into()));
        }

        let outcome = uploader(&store).upload(&path, "/b/s.tar", &events()).await;
        assert!(matches!(outcome, UploadOutcome::Failed { .. }));
        assert!(
            store.get_metadata("/b/s.tar").await.unwrap().is_none(),
            "no partial object may ever be visible"
        );
    }

    #[tokio::test]
    async fn prior_content_survives_failed_overwrite_attempt() {
        let dir = TempDir::new().unwrap();
        let path = snapshot(&dir, "s.tar", &vec![9u8; 2 * CHUNK + 1]);
        let store = MemoryStore::new();
        // Different prior object at an unrelated destination stays untouched.
        store.insert_object("/b/other.tar", b"unrelated".to_vec());
        for _ in 0..4 {
            store.inject_fault(Op::SessionFinish, StoreError::Transient("flaky".into()));
        }

        uploader(&store).upload(&path, "/b/s.tar", &events()).await;
        assert_eq!(store.object("/b/other.tar").unwrap(), b"unrelated");
    }

    #[tokio::test]
    async fn offset_contract_is_enforced_by_the_store() {
        let store = MemoryStore::new();
        let id = store.session_start(&[0u8; CHUNK]).await.unwrap();
        let err = store
            .session_append(&id, (CHUNK * 2) as u64, &[0u8; CHUNK])
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::OffsetMismatch { .. }));
    }
}
