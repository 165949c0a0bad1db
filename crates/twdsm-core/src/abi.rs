//! Fixed-layout descriptors shared with the Data Source Manager.
//!
//! Everything in this module crosses into a library that was compiled
//! elsewhere, so field order and widths follow the protocol headers exactly.
//! Records use 2-byte packing, which is what the headers declare, and none of
//! them carry compiler-inserted padding.

use std::ffi::c_void;
use std::fmt::{self, Debug, Formatter};
use std::marker::{PhantomData, PhantomPinned};
use std::mem::size_of;

/// Name of the single function every DSM exports.
pub const DSM_ENTRY_SYMBOL: &str = "DSM_Entry";

/// Identity record of a protocol participant.
///
/// Only pointers to identities pass through this layer, so the type is
/// opaque and cannot be constructed from Rust.
#[repr(C)]
pub struct Identity {
    _data: [u8; 0],
    _marker: PhantomData<(*mut u8, PhantomPinned)>,
}

/// Result code returned by every DSM call.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ReturnCode(pub u16);

impl ReturnCode {
    pub const SUCCESS: Self = Self(0);
    pub const FAILURE: Self = Self(1);
    pub const CHECK_STATUS: Self = Self(2);
    pub const CANCEL: Self = Self(3);
    pub const DS_EVENT: Self = Self(4);
    pub const NOT_DS_EVENT: Self = Self(5);
    pub const XFER_DONE: Self = Self(6);
    pub const END_OF_LIST: Self = Self(7);
    pub const INFO_NOT_SUPPORTED: Self = Self(8);
    pub const DATA_NOT_AVAILABLE: Self = Self(9);
    pub const BUSY: Self = Self(10);
    pub const SCANNER_LOCKED: Self = Self(11);

    pub const fn is_success(self) -> bool {
        self.0 == Self::SUCCESS.0
    }
}

/// Data group selector.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct DataGroup(pub u32);

impl DataGroup {
    pub const CONTROL: Self = Self(0x0001);
    pub const IMAGE: Self = Self(0x0002);
    pub const AUDIO: Self = Self(0x0004);
}

/// Data argument type selector.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dat(pub u16);

impl Dat {
    pub const NULL: Self = Self(0x0000);
    pub const IDENTITY: Self = Self(0x0003);
    pub const PARENT: Self = Self(0x0004);
    pub const CALLBACK: Self = Self(0x0010);
    pub const CALLBACK2: Self = Self(0x0012);
    pub const ENTRY_POINT: Self = Self(0x0403);
}

/// Message selector.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Msg(pub u16);

impl Msg {
    pub const NULL: Self = Self(0x0000);
    pub const GET: Self = Self(0x0001);
    pub const SET: Self = Self(0x0006);
    pub const XFER_READY: Self = Self(0x0101);
    pub const CLOSE_DS_REQ: Self = Self(0x0102);
    pub const CLOSE_DS_OK: Self = Self(0x0103);
    pub const DEVICE_EVENT: Self = Self(0x0104);
    pub const OPEN_DSM: Self = Self(0x0301);
    pub const CLOSE_DSM: Self = Self(0x0302);
    pub const REGISTER_CALLBACK: Self = Self(0x0902);
}

/// Handle to a block of memory owned by the DSM memory callbacks.
pub type MemHandle = *mut c_void;

/// The DSM entry function. All protocol traffic goes through this shape.
pub type DsmEntry = unsafe extern "system" fn(
    origin: *mut Identity,
    dest: *mut Identity,
    dg: DataGroup,
    dat: Dat,
    msg: Msg,
    data: *mut c_void,
) -> ReturnCode;

/// Callbacks registered with the DSM share the entry function signature.
pub type CallBackFunc = DsmEntry;

pub type MemAlloc = unsafe extern "system" fn(size: u32) -> MemHandle;
pub type MemFree = unsafe extern "system" fn(handle: MemHandle);
pub type MemLock = unsafe extern "system" fn(handle: MemHandle) -> *mut c_void;
pub type MemUnlock = unsafe extern "system" fn(handle: MemHandle);

/// Opaque constant of the legacy callback record.
///
/// Pointer-sized on macOS, 32 bits everywhere else.
#[cfg(target_os = "macos")]
pub type CallbackConstant = *mut c_void;

#[cfg(not(target_os = "macos"))]
pub type CallbackConstant = u32;

#[cfg(target_os = "macos")]
pub const NULL_CALLBACK_CONSTANT: CallbackConstant = std::ptr::null_mut();

#[cfg(not(target_os = "macos"))]
pub const NULL_CALLBACK_CONSTANT: CallbackConstant = 0;

/// Entry point table filled in by `DG_CONTROL / DAT_ENTRYPOINT / MSG_GET`.
///
/// The leading `size` field holds the byte size of the record so newer
/// runtimes can extend it.
#[repr(C, packed(2))]
#[derive(Clone, Copy)]
pub struct EntryPoint {
    size: u32,
    entry: Option<DsmEntry>,
    alloc: Option<MemAlloc>,
    free: Option<MemFree>,
    lock: Option<MemLock>,
    unlock: Option<MemUnlock>,
}

impl EntryPoint {
    /// Byte size of the table, as recorded in its first field.
    pub const SIZE: u32 = size_of::<EntryPoint>() as u32;

    /// An empty table: size recorded, every function absent.
    pub const fn empty() -> Self {
        Self {
            size: Self::SIZE,
            entry: None,
            alloc: None,
            free: None,
            lock: None,
            unlock: None,
        }
    }

    pub const fn new(
        entry: DsmEntry,
        alloc: MemAlloc,
        free: MemFree,
        lock: MemLock,
        unlock: MemUnlock,
    ) -> Self {
        Self {
            size: Self::SIZE,
            entry: Some(entry),
            alloc: Some(alloc),
            free: Some(free),
            lock: Some(lock),
            unlock: Some(unlock),
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn entry(&self) -> Option<DsmEntry> {
        self.entry
    }

    pub fn alloc(&self) -> Option<MemAlloc> {
        self.alloc
    }

    pub fn free(&self) -> Option<MemFree> {
        self.free
    }

    pub fn lock(&self) -> Option<MemLock> {
        self.lock
    }

    pub fn unlock(&self) -> Option<MemUnlock> {
        self.unlock
    }

    /// The four memory callbacks, if the DSM supplied all of them.
    pub fn memory_callbacks(&self) -> Option<MemoryCallbacks> {
        Some(MemoryCallbacks {
            alloc: self.alloc?,
            free: self.free?,
            lock: self.lock?,
            unlock: self.unlock?,
        })
    }

    /// Payload pointer for the call that asks the DSM to fill this table.
    pub fn as_mut_ptr(&mut self) -> *mut c_void {
        (self as *mut Self).cast()
    }
}

impl Default for EntryPoint {
    fn default() -> Self {
        Self::empty()
    }
}

impl Debug for EntryPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntryPoint")
            .field("size", &{ self.size })
            .field("entry", &{ self.entry }.is_some())
            .field("alloc", &{ self.alloc }.is_some())
            .field("free", &{ self.free }.is_some())
            .field("lock", &{ self.lock }.is_some())
            .field("unlock", &{ self.unlock }.is_some())
            .finish()
    }
}

/// Memory callbacks taken from a fully populated [`EntryPoint`].
#[derive(Debug, Clone, Copy)]
pub struct MemoryCallbacks {
    pub alloc: MemAlloc,
    pub free: MemFree,
    pub lock: MemLock,
    pub unlock: MemUnlock,
}

/// Legacy callback registration (`DAT_CALLBACK`).
#[repr(C, packed(2))]
#[derive(Clone, Copy)]
pub struct CallBack {
    func: Option<CallBackFunc>,
    constant: CallbackConstant,
    msg: Msg,
}

impl CallBack {
    pub const fn new(func: CallBackFunc, constant: CallbackConstant, msg: Msg) -> Self {
        Self {
            func: Some(func),
            constant,
            msg,
        }
    }

    pub fn func(&self) -> Option<CallBackFunc> {
        self.func
    }

    pub fn constant(&self) -> CallbackConstant {
        self.constant
    }

    pub fn msg(&self) -> Msg {
        self.msg
    }

    pub fn as_mut_ptr(&mut self) -> *mut c_void {
        (self as *mut Self).cast()
    }
}

impl Default for CallBack {
    fn default() -> Self {
        Self {
            func: None,
            constant: NULL_CALLBACK_CONSTANT,
            msg: Msg::NULL,
        }
    }
}

impl Debug for CallBack {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallBack")
            .field("func", &{ self.func }.is_some())
            .field("constant", &{ self.constant })
            .field("msg", &{ self.msg })
            .finish()
    }
}

/// Current callback registration (`DAT_CALLBACK2`), pointer-wide constant.
#[repr(C, packed(2))]
#[derive(Clone, Copy)]
pub struct CallBack2 {
    func: Option<CallBackFunc>,
    constant: usize,
    msg: Msg,
}

impl CallBack2 {
    pub const fn new(func: CallBackFunc, constant: usize, msg: Msg) -> Self {
        Self {
            func: Some(func),
            constant,
            msg,
        }
    }

    pub fn func(&self) -> Option<CallBackFunc> {
        self.func
    }

    pub fn constant(&self) -> usize {
        self.constant
    }

    pub fn msg(&self) -> Msg {
        self.msg
    }

    pub fn as_mut_ptr(&mut self) -> *mut c_void {
        (self as *mut Self).cast()
    }
}

impl Default for CallBack2 {
    fn default() -> Self {
        Self {
            func: None,
            constant: 0,
            msg: Msg::NULL,
        }
    }
}

impl Debug for CallBack2 {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallBack2")
            .field("func", &{ self.func }.is_some())
            .field("constant", &{ self.constant })
            .field("msg", &{ self.msg })
            .finish()
    }
}
