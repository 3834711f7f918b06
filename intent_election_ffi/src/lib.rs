#![allow(clippy::missing_safety_doc)]

use std::ptr;

use intent_election_core::ElectionCfg;
use intent_election_supervisor::{
    BasicInputBuilder, ElectionSupervisor, ElectionTally, SupervisorSnapshot, UtteranceEvent,
};
use tracing::warn;

/// FFI ABI version for intent_election_ffi.
///
/// Bump this when any `#[repr(C)]` struct layout or exported function signature changes.
pub const IEL_FFI_VERSION: u32 = 1;

#[no_mangle]
pub extern "C" fn iel_ffi_version() -> u32 {
    IEL_FFI_VERSION
}

// Snapshot wire format identification.
const SNAP_MAGIC: u32 = 0x314C_4549; // "IEL1" little-endian
const SNAP_VERSION: u32 = 1;
const SNAP_HEADER_LEN: usize = 12;

/// Opaque handle exposed over FFI.
pub struct IelSupervisor {
    inner: ElectionSupervisor,
    builder: BasicInputBuilder,
}

/// Owned byte buffer (JSON actions or snapshot). Free with `iel_bytes_free`.
#[repr(C)]
pub struct IelBytes {
    pub ptr: *mut u8,
    pub len: usize,
}

impl IelBytes {
    fn null() -> Self {
        IelBytes { ptr: ptr::null_mut(), len: 0 }
    }

    fn from_vec(buf: Vec<u8>) -> Self {
        let mut boxed = buf.into_boxed_slice();
        let ptr = boxed.as_mut_ptr();
        let len = boxed.len();
        std::mem::forget(boxed);
        IelBytes { ptr, len }
    }
}

/// Restore result statistics (FFI-safe).
#[repr(C)]
pub struct IelRestoreStats {
    pub applied: u32,
    pub overwritten: u32,
    pub rc: i32,
}

impl IelRestoreStats {
    fn err(rc: i32) -> Self {
        IelRestoreStats { applied: 0, overwritten: 0, rc }
    }
}

/// Election thresholds for FFI.
#[repr(C)]
#[derive(Clone, Copy)]
pub struct IelCfg {
    pub oos_as_none: f64,
    pub low_intent_confidence: f64,
    pub ambiguity_band: f64,
    pub confusion_diff_sigmas: f64,
    pub confusion_top3_std: f64,
    pub intent_round_places: u32,
    pub candidate_round_places: u32,
    /// Non-zero: clamp out-of-range scores into [0, 1] instead of rejecting them.
    pub clamp_unit: u8,
}

#[no_mangle]
pub extern "C" fn iel_cfg_default() -> IelCfg {
    let d = ElectionCfg::default();
    IelCfg {
        oos_as_none: d.oos_as_none,
        low_intent_confidence: d.low_intent_confidence,
        ambiguity_band: d.ambiguity_band,
        confusion_diff_sigmas: d.confusion_diff_sigmas,
        confusion_top3_std: d.confusion_top3_std,
        intent_round_places: d.intent_round_places,
        candidate_round_places: d.candidate_round_places,
        clamp_unit: 1,
    }
}

fn cfg_from_ffi(c: IelCfg) -> ElectionCfg {
    ElectionCfg {
        oos_as_none: c.oos_as_none,
        low_intent_confidence: c.low_intent_confidence,
        ambiguity_band: c.ambiguity_band,
        confusion_diff_sigmas: c.confusion_diff_sigmas,
        confusion_top3_std: c.confusion_top3_std,
        intent_round_places: c.intent_round_places,
        candidate_round_places: c.candidate_round_places,
    }
}

/// Create a new supervisor handle. Returns null if `cfg` fails validation.
///
/// Elections run on the rayon global pool; tallies are sharded by `stream_id`.
#[no_mangle]
pub extern "C" fn iel_supervisor_new(shards: usize, cfg: IelCfg) -> *mut IelSupervisor {
    let election_cfg = cfg_from_ffi(cfg);
    if let Err(err) = election_cfg.validate() {
        warn!(%err, "rejecting supervisor config");
        return ptr::null_mut();
    }
    let mut builder = BasicInputBuilder::default();
    builder.sanitizer.clamp_unit = cfg.clamp_unit != 0;
    let handle = IelSupervisor {
        inner: ElectionSupervisor::new(shards.max(1), election_cfg),
        builder,
    };
    Box::into_raw(Box::new(handle))
}

#[no_mangle]
pub unsafe extern "C" fn iel_supervisor_free(h: *mut IelSupervisor) {
    if !h.is_null() {
        drop(Box::from_raw(h));
    }
}

/// Elect a batch. Input: UTF-8 JSON array of utterance events. Output: JSON array
/// of actions in input order (free with `iel_bytes_free`). Null on any decode error.
#[no_mangle]
pub unsafe extern "C" fn iel_elect_json(h: *mut IelSupervisor, json_ptr: *const u8, json_len: usize) -> IelBytes {
    if h.is_null() || json_ptr.is_null() {
        return IelBytes::null();
    }
    let handle = &*h;
    let data = std::slice::from_raw_parts(json_ptr, json_len);

    let events: Vec<UtteranceEvent> = match serde_json::from_slice(data) {
        Ok(ev) => ev,
        Err(err) => {
            warn!(%err, "undecodable election batch");
            return IelBytes::null();
        }
    };

    let actions = handle.inner.elect_batch(&handle.builder, &events);
    match serde_json::to_vec(&actions) {
        Ok(buf) => IelBytes::from_vec(buf),
        Err(err) => {
            warn!(%err, "failed to encode election actions");
            IelBytes::null()
        }
    }
}

#[no_mangle]
pub unsafe extern "C" fn iel_bytes_free(b: IelBytes) {
    if !b.ptr.is_null() {
        let slice_ptr = ptr::slice_from_raw_parts_mut(b.ptr, b.len);
        drop(Box::from_raw(slice_ptr));
    }
}

/// Snapshot format (binary, little-endian):
/// [u32 magic = "IEL1"][u32 version = 1][u32 count]
/// repeated count times:
///   [u32 strlen][bytes...][u32 elected][u32 no_intent][u32 ambiguous][u32 failed]
#[no_mangle]
pub unsafe extern "C" fn iel_snapshot(h: *mut IelSupervisor) -> IelBytes {
    if h.is_null() {
        return IelBytes::null();
    }
    let handle = &*h;
    IelBytes::from_vec(encode_snapshot(&handle.inner.snapshot()))
}

fn encode_snapshot(snap: &SupervisorSnapshot) -> Vec<u8> {
    let mut buf: Vec<u8> = Vec::new();
    buf.extend_from_slice(&SNAP_MAGIC.to_le_bytes());
    buf.extend_from_slice(&SNAP_VERSION.to_le_bytes());
    buf.extend_from_slice(&(snap.tallies.len() as u32).to_le_bytes());

    for (id, t) in &snap.tallies {
        let idb = id.as_bytes();
        buf.extend_from_slice(&(idb.len() as u32).to_le_bytes());
        buf.extend_from_slice(idb);
        for v in [t.elected, t.no_intent, t.ambiguous, t.failed] {
            buf.extend_from_slice(&v.to_le_bytes());
        }
    }
    buf
}

fn read_u32(data: &[u8], i: &mut usize) -> Option<u32> {
    let bytes = data.get(*i..*i + 4)?;
    *i += 4;
    Some(u32::from_le_bytes(bytes.try_into().ok()?))
}

/// Decode a snapshot; `Err` carries the FFI return code.
fn decode_snapshot(data: &[u8]) -> Result<SupervisorSnapshot, i32> {
    let mut i = 0usize;
    let magic = read_u32(data, &mut i).ok_or(-2)?;
    if magic != SNAP_MAGIC {
        return Err(-8);
    }
    let ver = read_u32(data, &mut i).ok_or(-2)?;
    if ver != SNAP_VERSION {
        return Err(-9);
    }
    let count = read_u32(data, &mut i).ok_or(-2)? as usize;

    let mut tallies = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let slen = read_u32(data, &mut i).ok_or(-3)? as usize;
        let raw = data.get(i..i + slen).ok_or(-4)?;
        let id = std::str::from_utf8(raw).map_err(|_| -5)?.to_string();
        i += slen;

        let mut counts = [0u32; 4];
        for c in counts.iter_mut() {
            *c = read_u32(data, &mut i).ok_or(-6)?;
        }
        let [elected, no_intent, ambiguous, failed] = counts;
        tallies.push((id, ElectionTally { elected, no_intent, ambiguous, failed }));
    }
    Ok(SupervisorSnapshot { tallies })
}

/// Restore tallies from a snapshot produced by `iel_snapshot`.
///
/// `merge != 0` keeps existing tallies not present in the snapshot.
/// rc: 0 ok, -1 bad args, -2..-6 truncated/corrupt, -8 bad magic, -9 unsupported version.
#[no_mangle]
pub unsafe extern "C" fn iel_restore(
    h: *mut IelSupervisor,
    bytes: *const u8,
    len: usize,
    merge: u8,
) -> IelRestoreStats {
    if h.is_null() || bytes.is_null() || len < SNAP_HEADER_LEN {
        return IelRestoreStats::err(-1);
    }
    let handle = &*h;
    let data = std::slice::from_raw_parts(bytes, len);

    let snap = match decode_snapshot(data) {
        Ok(snap) => snap,
        Err(rc) => return IelRestoreStats::err(rc),
    };
    let stats = if merge != 0 {
        handle.inner.restore_merge(snap)
    } else {
        handle.inner.restore(snap)
    };

    IelRestoreStats {
        applied: stats.applied as u32,
        overwritten: stats.overwritten as u32,
        rc: 0,
    }
}
