//! Callback trampolines handed to the native engines
//!
//! The Info-ZIP callback ABI carries no user-data pointer, so the state a trampoline needs
//! (listener, password, comment) is bound to the calling thread for exactly the duration of
//! one blocking engine call. Engines call back synchronously on that thread, possibly many
//! times and through several different trampolines.

use crate::codec;
use crate::events::ServiceNotification;
use crate::status::ReplaceDecision;
use infozip_sys::{CALLBACK_STRING_SIZE, CallbackString, UnzipUserFunctions, ZipUserFunctions};
use std::cell::Cell;
use std::ffi::{CStr, c_char, c_int, c_uint};
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::ptr::{self, NonNull};
use tracing::{debug, trace, warn};

/// Reply telling the engine to carry on
pub(crate) const CONTINUE: c_int = 0;
/// Password or comment was written
pub(crate) const SUPPLIED: c_int = 0;
/// No password or comment available
pub(crate) const NOT_SUPPLIED: c_int = 1;

/// What a trampoline dispatches to during an engine call
pub(crate) trait Session {
    fn print(&mut self, message: &str);

    fn service(&mut self, notification: &ServiceNotification);

    fn application_message(&mut self, _notification: &ServiceNotification) {}

    fn sound(&mut self) {}

    fn file_replace(&mut self, _prompt: &str, _decision: &mut ReplaceDecision) {}

    fn password(&self) -> Option<&str>;

    fn comment(&self) -> Option<&str> {
        None
    }
}

thread_local! {
    static ACTIVE: Cell<Option<NonNull<dyn Session>>> = const { Cell::new(None) };
}

/// Keeps a session bound to the current thread; the previous binding returns on drop
pub(crate) struct SessionBinding<'a> {
    previous: Option<NonNull<dyn Session>>,
    _marker: PhantomData<(&'a mut (), *mut ())>,
}

/// Bind `session` as the target of every trampoline invoked on this thread
pub(crate) fn bind<'a>(session: &'a mut (dyn Session + 'a)) -> SessionBinding<'a> {
    let ptr: NonNull<dyn Session + 'a> = NonNull::from(session);
    // SAFETY: only the trait object lifetime changes. The binding borrows the session for
    // 'a and removes the pointer from the slot on drop, so it is never used after 'a.
    let ptr: NonNull<dyn Session + 'static> = unsafe { std::mem::transmute(ptr) };
    let previous = ACTIVE.with(|slot| slot.replace(Some(ptr)));
    SessionBinding {
        previous,
        _marker: PhantomData,
    }
}

impl Drop for SessionBinding<'_> {
    fn drop(&mut self) {
        ACTIVE.with(|slot| slot.set(self.previous));
    }
}

struct Restore(NonNull<dyn Session>);

impl Drop for Restore {
    fn drop(&mut self) {
        ACTIVE.with(|slot| slot.set(Some(self.0)));
    }
}

/// Run `f` against the bound session, or return `fallback` if there is none
///
/// The slot is emptied while `f` runs so a re-entrant callback cannot obtain a second
/// mutable reference. Panics are caught here and never unwind into native code.
fn dispatch<R>(fallback: R, f: impl FnOnce(&mut dyn Session) -> R) -> R {
    let Some(mut ptr) = ACTIVE.with(|slot| slot.take()) else {
        trace!("callback without an active session");
        return fallback;
    };
    let _restore = Restore(ptr);

    // SAFETY: the pointer was stored by a live SessionBinding on this thread and the slot
    // stays empty until `_restore` drops, so this is the only reference to the session.
    let session = unsafe { ptr.as_mut() };
    match panic::catch_unwind(AssertUnwindSafe(|| f(session))) {
        Ok(value) => value,
        Err(_) => {
            warn!("listener panicked inside an engine callback");
            fallback
        }
    }
}

/// # Safety
/// `message` must be null or point to a readable `CallbackString`.
unsafe fn message_text(message: *const CallbackString) -> String {
    if message.is_null() {
        return String::new();
    }
    // SAFETY: guaranteed by the caller; decoding never reads past the buffer
    codec::decode(unsafe { &(*message).buffer })
}

/// # Safety
/// `text` must be null or point to a null-terminated string.
unsafe fn c_text(text: *const c_char) -> String {
    if text.is_null() {
        return String::new();
    }
    // SAFETY: guaranteed by the caller
    codec::decode(unsafe { CStr::from_ptr(text) }.to_bytes())
}

pub(crate) unsafe extern "system" fn print_trampoline(
    message: *mut CallbackString,
    _size: c_uint,
) -> c_int {
    let text = unsafe { message_text(message) };
    trace!(message = %text, "print");
    dispatch((), |session| session.print(&text));
    CONTINUE
}

pub(crate) unsafe extern "system" fn service_trampoline(
    message: *mut CallbackString,
    size: c_uint,
) -> c_int {
    let notification = ServiceNotification::new(unsafe { message_text(message) }, u64::from(size));
    trace!(name = notification.name(), size, "service");
    dispatch((), |session| session.service(&notification));
    CONTINUE
}

pub(crate) unsafe extern "system" fn application_message_trampoline(
    message: *mut CallbackString,
    size: c_uint,
) -> c_int {
    let notification = ServiceNotification::new(unsafe { message_text(message) }, u64::from(size));
    dispatch((), |session| session.application_message(&notification));
    CONTINUE
}

pub(crate) unsafe extern "system" fn sound_trampoline() {
    dispatch((), |session| session.sound());
}

pub(crate) unsafe extern "system" fn replace_trampoline(
    message: *mut CallbackString,
    _size: c_uint,
) -> c_int {
    let prompt = unsafe { message_text(message) };
    let decision = dispatch(ReplaceDecision::default(), |session| {
        let mut decision = ReplaceDecision::default();
        session.file_replace(&prompt, &mut decision);
        decision
    });
    debug!(prompt = %prompt, ?decision, "file exists");
    decision.code()
}

pub(crate) unsafe extern "system" fn password_trampoline(
    buffer: *mut c_char,
    size: c_int,
    prompt: *const c_char,
    name: *const c_char,
) -> c_int {
    let (prompt, name) = unsafe { (c_text(prompt), c_text(name)) };
    trace!(prompt = %prompt, name = %name, size, "password requested");

    dispatch(NOT_SUPPLIED, |session| {
        let Some(password) = session.password() else {
            return NOT_SUPPLIED;
        };
        // SAFETY: the engine hands over a writable buffer of `size` bytes
        match unsafe { write_password(password, buffer, size) } {
            Ok(()) => SUPPLIED,
            Err(e) => {
                debug!("password not supplied: {}", e);
                NOT_SUPPLIED
            }
        }
    })
}

/// Bytes staged for a password: its encoding plus terminator, never more than the
/// engine offers
fn staging_len(password: &str, capacity: usize) -> usize {
    capacity.min(password.len() + 1)
}

/// Stage the password with its terminator, copy it out, then zero the rest of the
/// `size`-byte destination
///
/// # Safety
/// `destination` must be null or valid for writes of `size` bytes.
unsafe fn write_password(
    password: &str,
    destination: *mut c_char,
    size: c_int,
) -> crate::Result<()> {
    if destination.is_null() {
        return Err(crate::Error::InvalidArgument("null password buffer".to_string()));
    }
    let capacity = usize::try_from(size)
        .ok()
        .filter(|&n| n > 0)
        .ok_or_else(|| crate::Error::InvalidArgument(format!("password buffer size {size}")))?;

    let mut staging = vec![0u8; staging_len(password, capacity)];
    codec::encode_exact(password, &mut staging)?;
    let written = staging.len();
    // SAFETY: guaranteed by the caller; `written <= capacity`
    unsafe {
        let destination = destination.cast::<u8>();
        ptr::copy_nonoverlapping(staging.as_ptr(), destination, written);
        ptr::write_bytes(destination.add(written), 0, capacity - written);
    }
    Ok(())
}

pub(crate) unsafe extern "system" fn comment_trampoline(comment: *mut CallbackString) -> c_int {
    dispatch(NOT_SUPPLIED, |session| {
        let Some(text) = session.comment() else {
            return NOT_SUPPLIED;
        };
        if comment.is_null() {
            return NOT_SUPPLIED;
        }
        // SAFETY: the engine hands over a writable CallbackString
        let buffer: &mut [u8; CALLBACK_STRING_SIZE] = unsafe { &mut (*comment).buffer };
        codec::encode(text, buffer);
        SUPPLIED
    })
}

/// Callback table for `ZpInit`
pub(crate) fn zip_user_functions() -> ZipUserFunctions {
    ZipUserFunctions {
        print: Some(print_trampoline),
        comment: Some(comment_trampoline),
        password: Some(password_trampoline),
        service: Some(service_trampoline),
    }
}

/// Callback table for the unzip entry points
pub(crate) fn unzip_user_functions() -> UnzipUserFunctions {
    UnzipUserFunctions {
        print: Some(print_trampoline),
        sound: Some(sound_trampoline),
        replace: Some(replace_trampoline),
        password: Some(password_trampoline),
        application_message: Some(application_message_trampoline),
        service: Some(service_trampoline),
        ..UnzipUserFunctions::default()
    }
}
