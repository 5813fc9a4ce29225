use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use snapvault_transfer::content_hash_bytes;
use uuid::Uuid;

use crate::store::{RemoteMetadata, RemoteStore, StoreFuture};
use crate::StoreError;

/// Remote store operations, for fault injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    PutSmall,
    SessionStart,
    SessionAppend,
    SessionFinish,
    GetMetadata,
    Delete,
}

struct Inner {
    /// Committed objects, keyed by destination path.
    objects: HashMap<String, Vec<u8>>,
    /// Open sessions: accumulated bytes per session id.
    sessions: HashMap<String, Vec<u8>>,
    /// Planned errors, consumed by the next call of the matching op.
    faults: HashMap<Op, VecDeque<StoreError>>,
    calls: HashMap<Op, usize>,
}

/// In-memory [`RemoteStore`] backend.
///
/// Enforces the same contract a real backend would: the append offset must
/// match the accumulated session length, and an object only appears at its
/// destination when `put_small` or `session_finish` succeeds. Faults are
/// injected deterministically per operation, which is what makes the retry
/// and visibility properties testable without a network.
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                objects: HashMap::new(),
                sessions: HashMap::new(),
                faults: HashMap::new(),
                calls: HashMap::new(),
            }),
        }
    }

    /// Queues `error` to be returned by the next `op` call.
    /// Multiple injections for the same op are consumed in order.
    pub fn inject_fault(&self, op: Op, error: StoreError) {
        let mut inner = self.inner.lock().unwrap();
        inner.faults.entry(op).or_default().push_back(error);
    }

    /// Number of times `op` has been invoked (fault-returning calls count).
    pub fn calls(&self, op: Op) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.calls.get(&op).copied().unwrap_or(0)
    }

    /// Returns the committed bytes at `dest`, if any.
    pub fn object(&self, dest: &str) -> Option<Vec<u8>> {
        let inner = self.inner.lock().unwrap();
        inner.objects.get(dest).cloned()
    }

    /// Seeds a committed object directly (test setup).
    pub fn insert_object(&self, dest: &str, data: Vec<u8>) {
        let mut inner = self.inner.lock().unwrap();
        inner.objects.insert(dest.to_string(), data);
    }

    /// Number of sessions started but neither finished nor abandoned.
    pub fn open_sessions(&self) -> usize {
        let inner = self.inner.lock().unwrap();
        inner.sessions.len()
    }

    fn check(&self, op: Op) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().unwrap();
        *inner.calls.entry(op).or_insert(0) += 1;
        if let Some(queue) = inner.faults.get_mut(&op)
            && let Some(err) = queue.pop_front()
        {
            return Err(err);
        }
        Ok(())
    }
}

impl RemoteStore for MemoryStore {
    fn put_small<'a>(&'a self, dest: &'a str, data: &'a [u8]) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.check(Op::PutSmall)?;
            let mut inner = self.inner.lock().unwrap();
            inner.objects.insert(dest.to_string(), data.to_vec());
            Ok(())
        })
    }

    fn session_start<'a>(&'a self, first_chunk: &'a [u8]) -> StoreFuture<'a, String> {
        Box::pin(async move {
            self.check(Op::SessionStart)?;
            let id = Uuid::new_v4().to_string();
            let mut inner = self.inner.lock().unwrap();
            inner.sessions.insert(id.clone(), first_chunk.to_vec());
            Ok(id)
        })
    }

    fn session_append<'a>(
        &'a self,
        session_id: &'a str,
        offset: u64,
        chunk: &'a [u8],
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.check(Op::SessionAppend)?;
            let mut inner = self.inner.lock().unwrap();
            let buf = inner
                .sessions
                .get_mut(session_id)
                .ok_or_else(|| StoreError::Fatal(format!("unknown session: {session_id}")))?;
            if offset != buf.len() as u64 {
                return Err(StoreError::OffsetMismatch {
                    expected: buf.len() as u64,
                    got: offset,
                });
            }
            buf.extend_from_slice(chunk);
            Ok(())
        })
    }

    fn session_finish<'a>(
        &'a self,
        session_id: &'a str,
        offset: u64,
        last_chunk: &'a [u8],
        dest: &'a str,
    ) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.check(Op::SessionFinish)?;
            let mut inner = self.inner.lock().unwrap();
            let buf = inner
                .sessions
                .get(session_id)
                .ok_or_else(|| StoreError::Fatal(format!("unknown session: {session_id}")))?;
            if offset != buf.len() as u64 {
                return Err(StoreError::OffsetMismatch {
                    expected: buf.len() as u64,
                    got: offset,
                });
            }
            let mut data = inner.sessions.remove(session_id).unwrap();
            data.extend_from_slice(last_chunk);
            inner.objects.insert(dest.to_string(), data);
            Ok(())
        })
    }

    fn get_metadata<'a>(&'a self, dest: &'a str) -> StoreFuture<'a, Option<RemoteMetadata>> {
        Box::pin(async move {
            self.check(Op::GetMetadata)?;
            let inner = self.inner.lock().unwrap();
            Ok(inner.objects.get(dest).map(|data| RemoteMetadata {
                content_hash: content_hash_bytes(data),
                size: data.len() as u64,
            }))
        })
    }

    fn delete<'a>(&'a self, dest: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.check(Op::Delete)?;
            let mut inner = self.inner.lock().unwrap();
            inner
                .objects
                .remove(dest)
                .map(|_| ())
                .ok_or_else(|| StoreError::Fatal(format!("no object at {dest}")))
        })
    }
}
