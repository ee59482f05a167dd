//! Result object factory
//!
//! Wrapping is two-phase: the host shell is allocated first and only then is
//! the native record moved into the arena. A failed allocation hands the
//! record back to the caller untouched.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use crate::host::{HostError, HostRuntime, HostValue};
use crate::marshal;
use crate::types::{HostObjectRef, ObjectHandle, Result, WbemError};
use super::arena::RecordArena;
use super::record::{Property, ResultRecord};

/// Host object construction failed; the record is returned
#[derive(Error, Debug)]
#[error("could not wrap result record: {error}")]
pub struct WrapError {
    #[source]
    pub error: HostError,
    record: ResultRecord,
}

impl WrapError {
    /// Take back ownership of the record
    pub fn into_record(self) -> ResultRecord {
        self.record
    }
}

/// Host-visible result object
///
/// Carries the host's object reference and the arena handle of its native
/// record. The record is released exactly once, by [`dispose`](Self::dispose)
/// or by bridge shutdown; dropping the object does not release it.
pub struct HostResultObject {
    host_ref: HostObjectRef,
    handle: AtomicU64,
    arena: Arc<RecordArena>,
}

impl HostResultObject {
    pub fn host_ref(&self) -> HostObjectRef {
        self.host_ref
    }

    /// Current handle; `ObjectHandle::RELEASED` after disposal
    pub fn handle(&self) -> ObjectHandle {
        ObjectHandle::new(self.handle.load(Ordering::Acquire))
    }

    pub fn is_released(&self) -> bool {
        self.handle().is_released()
    }

    /// Release the native record; returns false if already released
    pub fn dispose(&self) -> bool {
        let handle = ObjectHandle::new(self.handle.swap(ObjectHandle::RELEASED.as_raw(), Ordering::AcqRel));
        if handle.is_released() {
            return false;
        }
        self.arena.release(handle).is_some()
    }

    fn live_handle(&self) -> Result<ObjectHandle> {
        let handle = self.handle();
        if handle.is_released() {
            Err(WbemError::ObjectReleased(handle))
        } else {
            Ok(handle)
        }
    }

    pub fn class_name(&self) -> Result<Option<String>> {
        let handle = self.live_handle()?;
        self.arena
            .with_record(handle, |obj| obj.class_name())
            .ok_or(WbemError::ObjectReleased(handle))
    }

    pub fn property_names(&self) -> Result<Vec<String>> {
        let handle = self.live_handle()?;
        self.arena
            .with_record(handle, |obj| obj.property_names())
            .ok_or(WbemError::ObjectReleased(handle))
    }

    /// Raw property as reported by the provider
    pub fn property(&self, name: &str) -> Result<Property> {
        let handle = self.live_handle()?;
        self.arena
            .with_record(handle, |obj| obj.get(name))
            .ok_or(WbemError::ObjectReleased(handle))?
            .ok_or_else(|| WbemError::PropertyNotFound(name.to_string()))
    }

    /// Property converted to the host object model
    pub fn get_value(&self, name: &str) -> Result<HostValue> {
        let property = self.property(name)?;
        marshal::convert(&property.value, property.cim_type)
    }
}

impl fmt::Debug for HostResultObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HostResultObject")
            .field("host_ref", &self.host_ref)
            .field("handle", &self.handle())
            .finish()
    }
}

/// Wraps native records into host result objects
pub struct ResultObjectFactory {
    runtime: Arc<dyn HostRuntime>,
    arena: Arc<RecordArena>,
}

impl ResultObjectFactory {
    pub fn new(runtime: Arc<dyn HostRuntime>, arena: Arc<RecordArena>) -> Self {
        Self { runtime, arena }
    }

    /// Wrap one record
    pub fn wrap(&self, record: ResultRecord) -> std::result::Result<HostResultObject, WrapError> {
        let host_ref = match self.runtime.allocate_object() {
            Ok(host_ref) => host_ref,
            Err(error) => return Err(WrapError { error, record }),
        };

        let handle = self.arena.insert(record);
        Ok(HostResultObject {
            host_ref,
            handle: AtomicU64::new(handle.as_raw()),
            arena: self.arena.clone(),
        })
    }

    /// Wrap a batch; records whose shell cannot be built are released
    pub fn wrap_all(&self, records: Vec<ResultRecord>) -> Vec<HostResultObject> {
        let mut objects = Vec::with_capacity(records.len());
        for record in records {
            match self.wrap(record) {
                Ok(object) => objects.push(object),
                Err(err) => {
                    tracing::warn!("can't instantiate host result object: {}", err.error);
                    drop(err.into_record());
                }
            }
        }
        objects
    }

    pub fn arena(&self) -> &Arc<RecordArena> {
        &self.arena
    }
}
