//! Integration tests for unbox/box marshaling
//!
//! Verifies round-trip identity, reference-count hand-off on every path,
//! the fault path, and construction from natively built representations.

use native_bridge::native::{FieldDecl, NativeTypeTag, RecordClass};
use native_bridge::runtime::{ForeignObject, HostRuntime, NativeRepr, ReprStorage};
use native_bridge::types::InternalType;
use native_bridge::{Error, ErrorSeverity, InteropContext};
use std::sync::Arc;

fn point() -> Arc<RecordClass> {
    RecordClass::new(
        "Point",
        vec![
            FieldDecl::new("x", NativeTypeTag::Int32),
            FieldDecl::new("y", NativeTypeTag::Int32),
        ],
    )
}

fn typed_point(ctx: &mut InteropContext) -> (ForeignObject, InternalType) {
    let obj = ForeignObject::record(&point(), vec![3, 0, 0, 0, 4, 0, 0, 0]).unwrap();
    let ty = ctx.typeof_value(&obj).unwrap();
    (obj, ty)
}

// =============================================================================
// ROUND TRIP
// =============================================================================

#[test]
fn test_unbox_then_box_returns_same_object() {
    let mut ctx = InteropContext::default();
    let rt = HostRuntime::new();
    let (obj, ty) = typed_point(&mut ctx);

    let value = ctx.unbox_value(&ty, &obj, &rt).unwrap();
    assert!(value.is_valid());
    let back = ctx.box_value(&ty, value.repr(), &rt).unwrap();
    assert!(back.ptr_eq(&obj));
    assert!(ctx.pending().is_empty());
}

#[test]
fn test_repr_aliases_foreign_storage() {
    let mut ctx = InteropContext::default();
    let rt = HostRuntime::new();
    let (obj, ty) = typed_point(&mut ctx);

    let value = ctx.unbox_value(&ty, &obj, &rt).unwrap();
    match value.repr().storage() {
        ReprStorage::Aliased { addr, len } => {
            assert_eq!(*addr, obj.address());
            assert_eq!(*len, 8);
        }
        other => panic!("Expected aliased storage, got {:?}", other),
    }
}

#[test]
fn test_ref_count_restored_after_round_trip() {
    let mut ctx = InteropContext::default();
    let rt = HostRuntime::new();
    let (obj, ty) = typed_point(&mut ctx);
    let before = obj.ref_count();

    let value = ctx.unbox_value(&ty, &obj, &rt).unwrap();
    assert_eq!(obj.ref_count(), before + 1);
    let back = ctx.box_value(&ty, value.repr(), &rt).unwrap();
    drop(value);
    drop(back);
    assert_eq!(obj.ref_count(), before);
}

#[test]
fn test_opaque_foreign_round_trip() {
    let mut ctx = InteropContext::default();
    let rt = HostRuntime::new();
    let (obj, _) = typed_point(&mut ctx);

    let value = ctx
        .unbox_value(&InternalType::OpaqueForeign, &obj, &rt)
        .unwrap();
    let back = ctx
        .box_value(&InternalType::OpaqueForeign, value.repr(), &rt)
        .unwrap();
    assert!(back.ptr_eq(&obj));
}

#[test]
fn test_second_box_does_not_find_pending_entry() {
    let mut ctx = InteropContext::default();
    let rt = HostRuntime::new();
    let (obj, ty) = typed_point(&mut ctx);

    let value = ctx.unbox_value(&ty, &obj, &rt).unwrap();
    ctx.box_value(&ty, value.repr(), &rt).unwrap();
    // the entry was popped; the object is alive but the aliased repr has no owner now
    assert!(matches!(
        ctx.box_value(&ty, value.repr(), &rt),
        Err(Error::MarshalingFault { .. })
    ));
}

// =============================================================================
// FAULTS
// =============================================================================

#[test]
fn test_runtime_error_marks_value_invalid() {
    let mut ctx = InteropContext::default();
    let rt = HostRuntime::new();
    let (obj, ty) = typed_point(&mut ctx);
    let before = obj.ref_count();

    rt.raise("object has been freed");
    let value = ctx.unbox_value(&ty, &obj, &rt).unwrap();
    assert!(!value.is_valid());
    let err = value.check().unwrap_err();
    assert_eq!(err.classify(), ErrorSeverity::Recoverable);
    assert!(ctx.pending().is_empty());

    drop(value);
    assert_eq!(obj.ref_count(), before);
}

#[test]
fn test_class_mismatch_takes_no_reference() {
    let mut ctx = InteropContext::default();
    let rt = HostRuntime::new();
    let (_, ty) = typed_point(&mut ctx);
    let stranger = ForeignObject::zeroed(&point());

    assert!(matches!(
        ctx.unbox_value(&ty, &stranger, &rt),
        Err(Error::ClassMismatch { .. })
    ));
    assert_eq!(stranger.ref_count(), 1);
    assert!(ctx.pending().is_empty());
}

// =============================================================================
// NATIVELY BUILT VALUES
// =============================================================================

#[test]
fn test_owned_repr_builds_new_instance() {
    let mut ctx = InteropContext::default();
    let rt = HostRuntime::new();
    let (obj, ty) = typed_point(&mut ctx);

    let repr = NativeRepr::owned(vec![9, 0, 0, 0, 8, 0, 0, 0]);
    let built = ctx.box_value(&ty, &repr, &rt).unwrap();
    assert!(!built.ptr_eq(&obj));
    assert_eq!(built.bytes(), &[9, 0, 0, 0, 8, 0, 0, 0]);
    assert_eq!(
        built.record_class().map(|c| c.id()),
        obj.record_class().map(|c| c.id())
    );
    assert!(ctx.pending().is_empty());

    // the new instance types as the same record
    assert_eq!(ctx.typeof_value(&built).unwrap(), ty);
}

#[test]
fn test_owned_repr_for_uncached_record_is_unsupported() {
    let mut ctx = InteropContext::default();
    let rt = HostRuntime::new();
    let (_, ty) = typed_point(&mut ctx);
    // a context that never typed the class cannot construct it
    let mut fresh = InteropContext::default();
    assert!(matches!(
        fresh.box_value(&ty, &NativeRepr::owned(vec![0; 8]), &rt),
        Err(Error::UnsupportedInternalType { .. })
    ));
}

#[test]
fn test_construction_fault_propagates() {
    let mut ctx = InteropContext::default();
    let rt = HostRuntime::new();
    let (_, ty) = typed_point(&mut ctx);

    rt.raise("out of memory");
    assert!(matches!(
        ctx.box_value(&ty, &NativeRepr::owned(vec![0; 8]), &rt),
        Err(Error::MarshalingFault { .. })
    ));
}

// =============================================================================
// PENDING CACHE LIFETIME
// =============================================================================

#[test]
fn test_pending_cache_does_not_keep_objects_alive() {
    let mut ctx = InteropContext::default();
    let rt = HostRuntime::new();
    let (obj, ty) = typed_point(&mut ctx);
    let weak = obj.downgrade();

    let value = ctx.unbox_value(&ty, &obj, &rt).unwrap();
    assert_eq!(ctx.pending().len(), 1);
    drop(value);
    drop(obj);
    assert!(!weak.is_alive());
}

#[test]
fn test_abandoned_values_leave_no_entries() {
    let opts = native_bridge::BridgeOptions {
        pending_prune_threshold: 4,
        ..Default::default()
    };
    let mut ctx = InteropContext::new(opts);
    let rt = HostRuntime::new();
    let class = point();
    let ty = ctx.typeof_value(&ForeignObject::zeroed(&class)).unwrap();

    // the owners stay alive; only the values are dropped without boxing
    let owners: Vec<ForeignObject> = (0..500).map(|_| ForeignObject::zeroed(&class)).collect();
    for obj in &owners {
        let value = ctx.unbox_value(&ty, obj, &rt).unwrap();
        drop(value);
    }
    assert!(ctx.pending().is_empty());
    assert!(owners.iter().all(|obj| obj.ref_count() == 1));
}

#[test]
fn test_outstanding_values_stay_pending() {
    let mut ctx = InteropContext::default();
    let rt = HostRuntime::new();
    let class = point();
    let ty = ctx.typeof_value(&ForeignObject::zeroed(&class)).unwrap();

    let owners: Vec<ForeignObject> = (0..200).map(|_| ForeignObject::zeroed(&class)).collect();
    let values: Vec<_> = owners
        .iter()
        .map(|obj| ctx.unbox_value(&ty, obj, &rt).unwrap())
        .collect();
    assert_eq!(ctx.pending().len(), 200);

    for (obj, value) in owners.iter().zip(&values).rev() {
        let back = ctx.box_value(&ty, value.repr(), &rt).unwrap();
        assert!(back.ptr_eq(obj));
    }
    assert!(ctx.pending().is_empty());
}

#[test]
fn test_released_guard_entries_are_pruned() {
    let opts = native_bridge::BridgeOptions {
        pending_prune_threshold: 4,
        ..Default::default()
    };
    let mut ctx = InteropContext::new(opts);
    let rt = HostRuntime::new();
    let class = point();
    let ty = ctx.typeof_value(&ForeignObject::zeroed(&class)).unwrap();

    // values kept, guards released, objects gone
    let mut values = Vec::new();
    for _ in 0..16 {
        let temp = ForeignObject::zeroed(&class);
        let mut value = ctx.unbox_value(&ty, &temp, &rt).unwrap();
        value.cleanup().release();
        values.push(value);
    }
    assert!(ctx.pending().len() <= 4);
    drop(values);
    assert!(ctx.pending().is_empty());
}

// =============================================================================
// BOX TYPE CHECKS
// =============================================================================

#[test]
fn test_box_as_other_record_is_class_mismatch() {
    let mut ctx = InteropContext::default();
    let rt = HostRuntime::new();
    let (obj, ty) = typed_point(&mut ctx);
    let extent = RecordClass::new(
        "Extent",
        vec![
            FieldDecl::new("w", NativeTypeTag::Int32),
            FieldDecl::new("h", NativeTypeTag::Int32),
        ],
    );
    let extent_ty = ctx.synthesize_record(&extent).unwrap();

    let value = ctx.unbox_value(&ty, &obj, &rt).unwrap();
    assert!(matches!(
        ctx.box_value(&extent_ty, value.repr(), &rt),
        Err(Error::ClassMismatch { .. })
    ));
    // the failed box did not use up the entry
    let back = ctx.box_value(&ty, value.repr(), &rt).unwrap();
    assert!(back.ptr_eq(&obj));
}

#[test]
fn test_owned_repr_of_pack2_record_fits_exactly() {
    let mut ctx = InteropContext::default();
    let rt = HostRuntime::new();
    let header = RecordClass::builder("Header").pack(2).fields(vec![
        FieldDecl::new("kind", NativeTypeTag::UInt8),
        FieldDecl::new("len", NativeTypeTag::UInt32),
    ]);
    let obj = ForeignObject::record(&header, vec![1, 0, 6, 0, 0, 0]).unwrap();
    let ty = ctx.typeof_value(&obj).unwrap();
    assert_eq!(obj.len(), 6);

    let repr = NativeRepr::owned(obj.bytes().to_vec());
    let built = ctx.box_value(&ty, &repr, &rt).unwrap();
    assert_eq!(built.bytes(), obj.bytes());
    assert!(!built.ptr_eq(&obj));
}
