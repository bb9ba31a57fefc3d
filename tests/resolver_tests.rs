//! Integration tests for native ⇄ internal type resolution
//!
//! Covers the builtin scalar table, recursive pointers in both directions,
//! and the two reverse-map policies.

use native_bridge::config::{BridgeOptions, ReversePolicy};
use native_bridge::native::{NativeType, NativeTypeTag};
use native_bridge::types::InternalType;
use native_bridge::{Error, InteropContext};

fn ctx() -> InteropContext {
    InteropContext::default()
}

fn resolve(ctx: &InteropContext, tag: NativeTypeTag) -> InternalType {
    ctx.resolve_from_native(&tag.into())
        .unwrap_or_else(|e| panic!("{} should resolve: {}", tag, e))
}

// =============================================================================
// FORWARD MAPPING
// =============================================================================

#[test]
fn test_fixed_width_tags() {
    let ctx = ctx();
    assert_eq!(resolve(&ctx, NativeTypeTag::Bool), InternalType::Bool);
    assert_eq!(resolve(&ctx, NativeTypeTag::Int8), InternalType::I8);
    assert_eq!(resolve(&ctx, NativeTypeTag::Int16), InternalType::I16);
    assert_eq!(resolve(&ctx, NativeTypeTag::Int32), InternalType::I32);
    assert_eq!(resolve(&ctx, NativeTypeTag::Int64), InternalType::I64);
    assert_eq!(resolve(&ctx, NativeTypeTag::UInt8), InternalType::U8);
    assert_eq!(resolve(&ctx, NativeTypeTag::UInt16), InternalType::U16);
    assert_eq!(resolve(&ctx, NativeTypeTag::UInt32), InternalType::U32);
    assert_eq!(resolve(&ctx, NativeTypeTag::UInt64), InternalType::U64);
    assert_eq!(resolve(&ctx, NativeTypeTag::Float), InternalType::F32);
    assert_eq!(resolve(&ctx, NativeTypeTag::Double), InternalType::F64);
    assert_eq!(resolve(&ctx, NativeTypeTag::LongDouble), InternalType::LongDouble);
}

#[test]
fn test_platform_integers_match_host_width() {
    let ctx = ctx();
    for tag in [
        NativeTypeTag::Int,
        NativeTypeTag::UInt,
        NativeTypeTag::Short,
        NativeTypeTag::UShort,
        NativeTypeTag::Long,
        NativeTypeTag::ULong,
        NativeTypeTag::LongLong,
        NativeTypeTag::ULongLong,
    ] {
        let ty = resolve(&ctx, tag);
        assert!(ty.is_integer(), "{} -> {}", tag, ty);
        assert_eq!(ty.size_bytes(), Some(tag.size()), "{}", tag);
        assert_eq!(ty.is_signed(), tag.is_signed(), "{}", tag);
    }
}

#[test]
fn test_byte_and_size_quirks() {
    let ctx = ctx();
    // c_byte is signed in C but maps to uint8
    assert_eq!(resolve(&ctx, NativeTypeTag::Byte), InternalType::U8);
    assert_eq!(resolve(&ctx, NativeTypeTag::UByte), InternalType::U8);
    assert!(!resolve(&ctx, NativeTypeTag::SSize).is_signed());
    assert!(!resolve(&ctx, NativeTypeTag::Size).is_signed());
}

#[test]
fn test_char_pointers() {
    let ctx = ctx();
    assert_eq!(resolve(&ctx, NativeTypeTag::Char), InternalType::I8);
    assert_eq!(
        resolve(&ctx, NativeTypeTag::CharP),
        InternalType::pointer_to(InternalType::I8)
    );
    let wchar = resolve(&ctx, NativeTypeTag::WChar);
    assert_eq!(
        resolve(&ctx, NativeTypeTag::WCharP),
        InternalType::pointer_to(wchar)
    );
}

#[test]
fn test_opaque_scalars() {
    let ctx = ctx();
    assert_eq!(resolve(&ctx, NativeTypeTag::VoidP), InternalType::VoidPtr);
    assert_eq!(resolve(&ctx, NativeTypeTag::Object), InternalType::ForcedObject);
}

#[test]
fn test_hresult_unmapped_by_default() {
    let ctx = ctx();
    match ctx.resolve_from_native(&NativeTypeTag::HResult.into()) {
        Err(Error::UnsupportedNativeType { ty }) => assert_eq!(ty, "HRESULT"),
        other => panic!("Expected UnsupportedNativeType, got {:?}", other),
    }
}

#[test]
fn test_every_other_tag_is_mapped() {
    let ctx = ctx();
    for tag in NativeTypeTag::ALL {
        if tag == NativeTypeTag::HResult {
            continue;
        }
        assert!(ctx.resolve_from_native(&tag.into()).is_ok(), "{}", tag);
    }
}

// =============================================================================
// POINTERS AND VOID
// =============================================================================

#[test]
fn test_void_both_ways() {
    let ctx = ctx();
    assert_eq!(
        ctx.resolve_from_native(&NativeType::Void).unwrap(),
        InternalType::None
    );
    assert_eq!(
        ctx.resolve_to_native(&InternalType::None).unwrap(),
        NativeType::Void
    );
}

#[test]
fn test_deep_pointer_resolution() {
    let ctx = ctx();
    let mut native: NativeType = NativeTypeTag::UInt64.into();
    let mut expected = InternalType::U64;
    for _ in 0..4 {
        native = NativeType::pointer_to(native);
        expected = InternalType::pointer_to(expected);
    }
    assert_eq!(ctx.resolve_from_native(&native).unwrap(), expected);
}

#[test]
fn test_pointer_to_unsupported_has_no_partial_result() {
    let ctx = ctx();
    let native = NativeType::pointer_to(NativeType::pointer_to(NativeTypeTag::HResult.into()));
    assert!(matches!(
        ctx.resolve_from_native(&native),
        Err(Error::UnsupportedNativeType { .. })
    ));
}

// =============================================================================
// REVERSE MAPPING
// =============================================================================

#[test]
fn test_uint32_round_trip_up_to_width_and_sign() {
    let ctx = ctx();
    let native = ctx.resolve_to_native(&InternalType::U32).unwrap();
    let back = ctx.resolve_from_native(&native).unwrap();
    assert_eq!(back, InternalType::U32);
}

#[test]
fn test_canonical_policy_prefers_fixed_width() {
    let ctx = ctx();
    assert_eq!(
        ctx.resolve_to_native(&InternalType::I32).unwrap(),
        NativeType::from(NativeTypeTag::Int32)
    );
    assert_eq!(
        ctx.resolve_to_native(&InternalType::U8).unwrap(),
        NativeType::from(NativeTypeTag::UInt8)
    );
    assert_eq!(
        ctx.resolve_to_native(&InternalType::pointer_to(InternalType::I8))
            .unwrap(),
        NativeType::pointer_to(NativeTypeTag::Int8.into())
    );
}

#[test]
fn test_last_inserted_policy() {
    let opts = BridgeOptions::default().with_reverse_policy(ReversePolicy::LastInserted);
    let ctx = InteropContext::new(opts);
    assert_eq!(
        ctx.resolve_to_native(&InternalType::U8).unwrap(),
        NativeType::from(NativeTypeTag::Byte)
    );
}

#[test]
fn test_scalar_round_trip_for_every_internal_scalar() {
    let ctx = ctx();
    for ty in [
        InternalType::Bool,
        InternalType::I8,
        InternalType::I16,
        InternalType::I32,
        InternalType::I64,
        InternalType::U8,
        InternalType::U16,
        InternalType::U32,
        InternalType::U64,
        InternalType::F32,
        InternalType::F64,
        InternalType::VoidPtr,
        InternalType::ForcedObject,
    ] {
        let native = ctx.resolve_to_native(&ty).unwrap();
        assert_eq!(ctx.resolve_from_native(&native).unwrap(), ty);
    }
}

#[test]
fn test_composites_have_no_native_form() {
    let ctx = ctx();
    assert!(matches!(
        ctx.resolve_to_native(&InternalType::OpaqueForeign),
        Err(Error::UnsupportedInternalType { .. })
    ));
}
