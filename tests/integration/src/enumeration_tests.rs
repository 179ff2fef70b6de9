//! Enumeration Tests - collection views and deferred queries
//!
//! These tests exercise lazy enumeration over simulated collections:
//! - Elements arrive in server order, one pull at a time
//! - Views are single-pass; a second pass needs a new view
//! - Modifying a collection invalidates running enumerations
//! - Queries filter and project lazily and stop at the first error

mod common;

use std::cell::Cell;

use common::*;
use vissim_com::types::attribute;
use vissim_com::{ComError, Variant};

#[test]
fn test_view_yields_links_in_order() {
    let server = server_with_links(15);
    let links = server.vissim().net().unwrap().links().unwrap();
    assert_eq!(links.count().unwrap(), 15);

    let numbers: Vec<i32> = links
        .view()
        .unwrap()
        .map(|link| link.and_then(|link| link.no()))
        .collect::<Result<_, _>>()
        .unwrap();
    assert_eq!(numbers, (1..=15).collect::<Vec<_>>());
}

#[test]
fn test_empty_collection() {
    let server = server_with_links(0);
    let mut view = server.vissim().net().unwrap().links().unwrap().view().unwrap();
    assert!(view.next().is_none());
    assert!(view.is_finished());
    assert!(view.next().is_none());
}

#[test]
fn test_second_view_sees_same_elements() {
    let server = server_with_links(6);
    let links = server.vissim().net().unwrap().links().unwrap();

    let mut first = links.view().unwrap();
    assert_eq!(first.by_ref().count(), 6);
    assert_eq!(first.yielded(), 6);
    assert!(first.next().is_none());

    assert_eq!(links.view().unwrap().count(), 6);
}

#[test]
fn test_links_above_ten() {
    let server = server_with_links(15);
    let selected: Vec<i32> = server
        .vissim()
        .net()
        .unwrap()
        .links()
        .unwrap()
        .query()
        .unwrap()
        .filter(|link| Ok(link.no()? > 10))
        .project(|link| link.no())
        .try_collect()
        .unwrap();
    assert_eq!(selected, vec![11, 12, 13, 14, 15]);
    assert_balanced(&server);
}

#[test]
fn test_query_is_deferred_until_pulled() {
    let server = server_with_links(15);
    let evaluated = Cell::new(0);

    let mut query = server
        .vissim()
        .net()
        .unwrap()
        .links()
        .unwrap()
        .query()
        .unwrap()
        .filter(|link| {
            evaluated.set(evaluated.get() + 1);
            Ok(link.no()? % 5 == 0)
        });
    assert_eq!(evaluated.get(), 0);

    let first = query.next().unwrap().unwrap();
    assert_eq!(first.no().unwrap(), 5);
    assert_eq!(evaluated.get(), 5);
}

#[test]
fn test_modification_invalidates_enumeration() {
    let server = server_with_links(5);
    let mut view = server.vissim().net().unwrap().links().unwrap().view().unwrap();

    assert!(view.next().unwrap().is_ok());
    assert!(view.next().unwrap().is_ok());
    server.add_link(6);

    assert!(matches!(
        view.next(),
        Some(Err(ComError::EnumerationInvalidated(_)))
    ));
    assert!(view.next().is_none());
    assert_eq!(view.yielded(), 2);

    // A fresh view sees the new element.
    assert_eq!(server.vissim().net().unwrap().links().unwrap().view().unwrap().count(), 6);
}

#[test]
fn test_removal_invalidates_query() {
    let server = server_with_links(8);
    let mut query = server
        .vissim()
        .net()
        .unwrap()
        .links()
        .unwrap()
        .query()
        .unwrap()
        .project(|link| link.no());

    assert_eq!(query.next().unwrap().unwrap(), 1);
    server.remove_link(8);
    assert!(matches!(
        query.next(),
        Some(Err(ComError::EnumerationInvalidated(_)))
    ));
    assert!(query.next().is_none());
}

#[test]
fn test_coercion_failure_stops_query() {
    let server = server_with_links(5);
    server
        .set_link_attribute(3, attribute::NO, Variant::from("three"))
        .unwrap();

    let result: Result<Vec<i32>, _> = server
        .vissim()
        .net()
        .unwrap()
        .links()
        .unwrap()
        .query()
        .unwrap()
        .filter(|link| Ok(link.no()? > 1))
        .project(|link| link.no())
        .try_collect();

    assert!(matches!(
        result,
        Err(ComError::AttributeTypeMismatch { expected: "i32", found: "string" })
    ));
}

#[test]
fn test_vehicle_view_reads_attributes() {
    let server = server_with_links(1);
    server.add_vehicle(1, 42.0);
    server.add_vehicle(2, 13.5);

    let speeds: Vec<f64> = server
        .vissim()
        .net()
        .unwrap()
        .vehicles()
        .unwrap()
        .query()
        .unwrap()
        .project(|vehicle| f64::try_from(&vehicle.att_value("Speed")?))
        .try_collect()
        .unwrap();
    assert_eq!(speeds, vec![42.0, 13.5]);
}
