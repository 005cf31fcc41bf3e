//! This module provides a set of shared, low-level utility functions used
//! throughout the fieldmesh core.
//!
//! Its primary responsibility is providing zero-copy byte views of typed slices,
//! so that the messaging layer can move `f32` payloads and `i64` bounds as plain
//! bytes without any `unsafe` code.

//==================================================================================
// 1. Core Utility Functions
//==================================================================================

/// Views a typed slice as its underlying bytes. Zero-copy.
pub fn as_bytes<T: bytemuck::Pod>(data: &[T]) -> &[u8] {
    bytemuck::cast_slice(data)
}

/// Views a mutable typed slice as its underlying bytes. Zero-copy; writes through
/// the returned slice land directly in `data`.
pub fn as_bytes_mut<T: bytemuck::Pod>(data: &mut [T]) -> &mut [u8] {
    bytemuck::cast_slice_mut(data)
}
