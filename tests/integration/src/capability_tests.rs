//! Capability Tests - native window control through resolved identities
//!
//! These tests exercise native capability invocation:
//! - Each call resolves a fresh identity and releases it afterwards
//! - The native module sees exactly one reference held during the call
//! - The reference is released even when the native call fails
//! - Disconnected targets never reach the native module

mod common;

use std::panic::{self, AssertUnwindSafe};

use common::*;
use vissim_com::{invoke, resolve, NativeLibrary, NativeOp, WindowControl};

#[test]
fn test_hide_then_restore() {
    let server = server_with_links(1);
    let utilities = server.utilities();
    let vissim = server.vissim();
    let root = resolve(&vissim).unwrap().identity().addr();

    vissim.hide_main_window(&utilities).unwrap();
    assert!(!server.window_visible());
    vissim.restore_main_window(&utilities).unwrap();
    assert!(server.window_visible());

    let calls = server.native_calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].op, NativeOp::HideWindow);
    assert_eq!(calls[1].op, NativeOp::ShowWindow);
    for call in &calls {
        assert_eq!(call.identity, root);
        assert_eq!(call.refs_during_call, 1);
    }
    assert_balanced(&server);
}

#[test]
fn test_each_call_resolves_afresh() {
    let server = server_with_links(1);
    let utilities = server.utilities();
    let vissim = server.vissim();

    for _ in 0..3 {
        vissim.hide_main_window(&utilities).unwrap();
        vissim.restore_main_window(&utilities).unwrap();
    }

    assert_eq!(server.identity_traffic(), (6, 6));
    assert_eq!(server.native_calls().len(), 6);
    assert!(server.window_visible());
}

#[test]
fn test_hide_twice_is_idempotent() {
    let server = server_with_links(1);
    let utilities = server.utilities();
    let vissim = server.vissim();

    vissim.hide_main_window(&utilities).unwrap();
    vissim.hide_main_window(&utilities).unwrap();
    assert!(!server.window_visible());
    assert_balanced(&server);
}

#[test]
fn test_identity_released_when_native_call_fails() {
    let server = server_with_links(1);
    let utilities = server.utilities();
    let vissim = server.vissim();

    utilities.fail_next_call();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| vissim.hide_main_window(&utilities)));
    assert!(outcome.is_err());

    assert_eq!(server.native_calls().len(), 1);
    assert_balanced(&server);

    // The module keeps working afterwards.
    vissim.restore_main_window(&utilities).unwrap();
    assert!(server.window_visible());
    assert_balanced(&server);
}

#[test]
fn test_disconnected_target_skips_native_call() {
    let server = server_with_links(1);
    let utilities = server.utilities();
    let vissim = server.vissim();
    vissim.exit().unwrap();

    let err = vissim.hide_main_window(&utilities).unwrap_err();
    assert!(err.is_disconnected());
    assert!(server.native_calls().is_empty());
    assert_eq!(server.identity_traffic(), (0, 0));
}

#[test]
fn test_invoke_on_non_root_object_leaves_window_alone() {
    let server = server_with_links(2);
    let utilities = server.utilities();
    let link = server
        .vissim()
        .net()
        .unwrap()
        .links()
        .unwrap()
        .item_by_key(2)
        .unwrap();

    invoke(&link, &utilities, NativeOp::HideWindow).unwrap();
    assert!(server.window_visible());

    let calls = server.native_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].identity, resolve(&link).unwrap().identity().addr());
    assert_balanced(&server);
}

#[test]
fn test_export_names() {
    assert_eq!(NativeOp::HideWindow.export_name(), "HideVissim");
    assert_eq!(NativeOp::ShowWindow.export_name(), "ShowVissim");
    assert_eq!(NativeOp::ALL.len(), 2);
}

#[cfg(not(windows))]
#[test]
fn test_native_library_unavailable_off_windows() {
    let err = NativeLibrary::utilities().unwrap_err();
    assert!(matches!(err, vissim_com::ComError::Unsupported(_)));
}

#[cfg(windows)]
#[test]
fn test_missing_native_library() {
    let err = NativeLibrary::load("does-not-exist-vissim-utilities.dll").unwrap_err();
    assert!(matches!(err, vissim_com::ComError::NativeModule(_)));
}
