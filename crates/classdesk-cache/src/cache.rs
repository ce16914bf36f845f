//! The entity cache: a lazily loaded, write-through mirror of the
//! remote collections.
//!
//! # Write discipline
//!
//! Every mutation goes to the remote store first. Only the row the store
//! sends back is written into the mirror, reconciled by key. A rejected
//! write returns an error and touches nothing.
//!
//! # Generations
//!
//! [`invalidate`](EntityCache::invalidate) (run on logout) bumps a
//! generation counter. A refresh or mutation that started under an older
//! generation still completes remotely, but its result is dropped
//! instead of leaking the previous user's data into the emptied mirror.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use classdesk_model::{
    Booking, BookingDraft, BookingId, BookingPatch, BookingStatus, LeaveRequest,
    LeaveRequestDraft, LeaveRequestId, LeaveRequestPatch, LeaveStatus, Payroll,
    PayrollDraft, PayrollId, PayrollPatch, PayrollStatus, Student, StudentDraft,
    StudentId, StudentPatch, StudentStatus, Teacher, TeacherDraft, TeacherId,
    TeacherPatch, TeacherStatus, UserIdentity,
};
use classdesk_remote::{
    Query, RESTORE_RECORD, RecordRef, RemoteError, RemoteStore, Row,
    SOFT_DELETE_RECORD,
};
use tokio::sync::{Mutex, RwLock};

use crate::mirror::Mirrored;
use crate::{BookingView, CacheError, Mirror, StudentProfile, TeacherProfile};

/// One process-wide mirror of the remote entity collections.
pub struct EntityCache<R> {
    remote: Arc<R>,
    mirror: RwLock<Mirror>,
    initialized: AtomicBool,
    generation: AtomicU64,
    /// Held for the duration of a first load so concurrent callers wait
    /// on it instead of starting their own.
    init_gate: Mutex<()>,
}

impl<R: RemoteStore> EntityCache<R> {
    /// Creates an empty, uninitialized cache.
    pub fn new(remote: Arc<R>) -> Self {
        Self {
            remote,
            mirror: RwLock::new(Mirror::default()),
            initialized: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            init_gate: Mutex::new(()),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Returns a copy of the current mirror.
    pub async fn snapshot(&self) -> Mirror {
        self.mirror.read().await.clone()
    }

    pub async fn teacher_profiles(&self) -> Vec<TeacherProfile> {
        self.mirror.read().await.teacher_profiles()
    }

    pub async fn student_profiles(&self) -> Vec<StudentProfile> {
        self.mirror.read().await.student_profiles()
    }

    pub async fn booking_view(&self) -> Vec<BookingView> {
        self.mirror.read().await.booking_view()
    }

    fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    // -- Loading -------------------------------------------------------

    /// Loads every collection once.
    ///
    /// Calls made while a first load is running wait for it rather than
    /// starting another. If that load fails, the next call tries again.
    ///
    /// # Errors
    /// The first [`CacheError::Refresh`] of the load.
    pub async fn ensure_initialized(&self) -> Result<(), CacheError> {
        if self.is_initialized() {
            return Ok(());
        }
        let _gate = self.init_gate.lock().await;
        if self.is_initialized() {
            return Ok(());
        }

        let generation = self.generation();
        self.refresh_all().await?;
        if self.generation() == generation {
            self.initialized.store(true, Ordering::Release);
            tracing::debug!("entity cache initialized");
        }
        Ok(())
    }

    /// Re-fetches every collection concurrently.
    ///
    /// Each collection is replaced as soon as its own fetch lands. When
    /// one fails the rest still run to completion, so the mirror may end
    /// up with some collections fresh and others stale.
    ///
    /// # Errors
    /// The first failed collection, in declaration order.
    pub async fn refresh_all(&self) -> Result<(), CacheError> {
        let generation = self.generation();
        let (users, teachers, students, bookings, payrolls, leave_requests) = futures_util::join!(
            self.refresh::<UserIdentity>(generation),
            self.refresh::<Teacher>(generation),
            self.refresh::<Student>(generation),
            self.refresh::<Booking>(generation),
            self.refresh::<Payroll>(generation),
            self.refresh::<LeaveRequest>(generation),
        );
        users
            .and(teachers)
            .and(students)
            .and(bookings)
            .and(payrolls)
            .and(leave_requests)
    }

    async fn refresh<T: Mirrored>(&self, generation: u64) -> Result<(), CacheError> {
        let rows = self
            .remote
            .select::<T>(&T::refresh_query())
            .await
            .map_err(|source| {
                tracing::warn!(table = T::TABLE, error = %source, "collection fetch failed");
                CacheError::Refresh {
                    collection: T::TABLE,
                    source,
                }
            })?;

        let mut mirror = self.mirror.write().await;
        if self.generation() != generation {
            tracing::debug!(table = T::TABLE, "discarding superseded fetch");
            return Ok(());
        }
        tracing::debug!(table = T::TABLE, rows = rows.len(), "collection refreshed");
        *T::slot(&mut mirror) = rows;
        Ok(())
    }

    /// Empties the mirror and marks it uninitialized.
    ///
    /// Anything still in flight from before the call is discarded when it
    /// lands.
    pub async fn invalidate(&self) {
        let mut mirror = self.mirror.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        self.initialized.store(false, Ordering::Release);
        *mirror = Mirror::default();
        tracing::debug!("entity cache invalidated");
    }

    // -- Mutations -----------------------------------------------------

    /// Inserts or overwrites a profile row.
    pub async fn upsert_user(&self, user: &UserIdentity) -> Result<UserIdentity, CacheError> {
        let generation = self.generation();
        let row = self
            .remote
            .upsert::<UserIdentity>(user)
            .await
            .map_err(rejected::<UserIdentity>)?;
        self.mirror_row(generation, row.clone()).await;
        Ok(row)
    }

    pub async fn add_teacher(&self, draft: &TeacherDraft) -> Result<Teacher, CacheError> {
        self.insert::<Teacher>(draft).await
    }

    pub async fn update_teacher_status(
        &self,
        id: &TeacherId,
        status: TeacherStatus,
    ) -> Result<Teacher, CacheError> {
        let patch = TeacherPatch {
            status: Some(status),
            ..TeacherPatch::default()
        };
        self.update::<Teacher>(id.as_str(), &patch).await
    }

    pub async fn add_student(&self, draft: &StudentDraft) -> Result<Student, CacheError> {
        self.insert::<Student>(draft).await
    }

    pub async fn update_student_status(
        &self,
        id: &StudentId,
        status: StudentStatus,
    ) -> Result<Student, CacheError> {
        let patch = StudentPatch {
            status: Some(status),
        };
        self.update::<Student>(id.as_str(), &patch).await
    }

    /// Soft-deletes a student. The row drops out of the mirror.
    pub async fn archive_student(&self, id: &StudentId) -> Result<(), CacheError> {
        let generation = self.generation();
        let _: Student = self
            .remote
            .rpc(SOFT_DELETE_RECORD, &RecordRef::of::<Student>(id.as_str()))
            .await
            .map_err(rejected::<Student>)?;

        let mut mirror = self.mirror.write().await;
        if self.generation() != generation {
            tracing::debug!(table = Student::TABLE, "discarding superseded archive");
            return Ok(());
        }
        mirror.remove::<Student>(id.as_str());
        Ok(())
    }

    /// Clears a student's soft delete and mirrors the restored row.
    pub async fn restore_student(&self, id: &StudentId) -> Result<Student, CacheError> {
        let generation = self.generation();
        let row: Student = self
            .remote
            .rpc(RESTORE_RECORD, &RecordRef::of::<Student>(id.as_str()))
            .await
            .map_err(rejected::<Student>)?;
        self.mirror_row(generation, row.clone()).await;
        Ok(row)
    }

    pub async fn add_booking(&self, draft: &BookingDraft) -> Result<Booking, CacheError> {
        self.insert::<Booking>(draft).await
    }

    pub async fn update_booking_status(
        &self,
        id: &BookingId,
        status: BookingStatus,
    ) -> Result<Booking, CacheError> {
        let patch = BookingPatch {
            status: Some(status),
            ..BookingPatch::default()
        };
        self.update::<Booking>(id.as_str(), &patch).await
    }

    pub async fn add_payroll(&self, draft: &PayrollDraft) -> Result<Payroll, CacheError> {
        self.insert::<Payroll>(draft).await
    }

    pub async fn update_payroll_status(
        &self,
        id: &PayrollId,
        status: PayrollStatus,
    ) -> Result<Payroll, CacheError> {
        let patch = PayrollPatch {
            status: Some(status),
        };
        self.update::<Payroll>(id.as_str(), &patch).await
    }

    pub async fn add_leave_request(
        &self,
        draft: &LeaveRequestDraft,
    ) -> Result<LeaveRequest, CacheError> {
        self.insert::<LeaveRequest>(draft).await
    }

    pub async fn approve_leave(&self, id: &LeaveRequestId) -> Result<LeaveRequest, CacheError> {
        self.set_leave_status(id, LeaveStatus::Approved).await
    }

    pub async fn reject_leave(&self, id: &LeaveRequestId) -> Result<LeaveRequest, CacheError> {
        self.set_leave_status(id, LeaveStatus::Rejected).await
    }

    async fn set_leave_status(
        &self,
        id: &LeaveRequestId,
        status: LeaveStatus,
    ) -> Result<LeaveRequest, CacheError> {
        let patch = LeaveRequestPatch {
            status: Some(status),
        };
        self.update::<LeaveRequest>(id.as_str(), &patch).await
    }

    // -- Write-through helpers -----------------------------------------

    async fn insert<T: Mirrored>(&self, draft: &T::Draft) -> Result<T, CacheError> {
        let generation = self.generation();
        let row = self
            .remote
            .insert::<T>(draft)
            .await
            .map_err(rejected::<T>)?;
        self.mirror_row(generation, row.clone()).await;
        Ok(row)
    }

    async fn update<T: Mirrored>(&self, id: &str, patch: &T::Patch) -> Result<T, CacheError> {
        let generation = self.generation();
        let rows = self
            .remote
            .update::<T>(&Query::all().eq(T::KEY, id), patch)
            .await
            .map_err(rejected::<T>)?;
        let row = rows.into_iter().next().ok_or_else(|| CacheError::NotFound {
            collection: T::TABLE,
            id: id.to_string(),
        })?;
        self.mirror_row(generation, row.clone()).await;
        Ok(row)
    }

    async fn mirror_row<T: Mirrored>(&self, generation: u64, row: T) {
        let mut mirror = self.mirror.write().await;
        if self.generation() != generation {
            tracing::debug!(table = T::TABLE, key = row.key(), "discarding superseded write");
            return;
        }
        mirror.reconcile(row);
    }
}

fn rejected<T: Mirrored>(source: RemoteError) -> CacheError {
    tracing::warn!(table = T::TABLE, error = %source, "write rejected");
    CacheError::Mutation {
        collection: T::TABLE,
        source,
    }
}
