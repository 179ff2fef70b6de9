//! Session Tests - end-to-end scenarios on the simulated server
//!
//! These tests drive complete automation sessions:
//! - Load a scenario, configure it, run it and exit
//! - Query the network between loading and running
//! - Hide the main window around a bounded run
//! - Behaviour after the server has exited

mod common;

use common::*;
use vissim_com::types::attribute;
use vissim_com::{ComError, SessionConfig, WindowControl};

fn sim_sec(server: &vissim_com::sim::SimServer) -> f64 {
    let value = server
        .vissim()
        .simulation()
        .unwrap()
        .att_value(attribute::SIM_SEC)
        .unwrap();
    f64::try_from(&value).unwrap()
}

#[test]
fn test_basic_commands() {
    let server = server_with_links(15);
    let session = session_on(&server, SessionConfig::default());

    session.load_network(session.config().network_path()).unwrap();
    session.set_quick_mode(true).unwrap();
    session.run_continuous().unwrap();
    assert_eq!(sim_sec(&server), 3600.0);
    session.exit().unwrap();

    assert_eq!(server.run_count(), 1);
    assert!(server.has_exited());
    assert!(server.vissim().simulation().unwrap_err().is_disconnected());
}

#[test]
fn test_query_between_load_and_run() {
    let server = server_with_links(15);
    let config = SessionConfig::builder().quick_mode(false).build();
    let session = session_on(&server, config);
    session.load_scenario().unwrap();

    let selected: Vec<i32> = session
        .links()
        .unwrap()
        .query()
        .filter(|link| Ok(link.no()? > 10))
        .project(|link| link.no())
        .try_collect()
        .unwrap();
    assert_eq!(selected, vec![11, 12, 13, 14, 15]);

    let quick_mode = session
        .vissim()
        .graphics()
        .unwrap()
        .att_value(attribute::QUICK_MODE)
        .unwrap();
    assert!(!bool::try_from(&quick_mode).unwrap());
    session.set_quick_mode(true).unwrap();
    session.run_continuous().unwrap();
    session.exit().unwrap();
    assert_balanced(&server);
}

#[test]
fn test_hidden_bounded_run() {
    let server = server_with_links(15);
    let config = SessionConfig::builder().sim_break_at(60.0).build();
    let session = session_on(&server, config);

    session.load_scenario().unwrap();
    session.hide_main_window().unwrap();
    assert!(!server.window_visible());

    session.run_continuous().unwrap();
    assert_eq!(sim_sec(&server), 60.0);

    session.restore_main_window().unwrap();
    assert!(server.window_visible());
    session.exit().unwrap();

    assert_eq!(server.native_calls().len(), 2);
    assert_balanced(&server);
}

#[test]
fn test_scenario_paths_resolved_against_folder() {
    let server = server_with_links(1);
    let config = SessionConfig::builder()
        .example_folder("training")
        .network_file("net.inpx")
        .layout_file("net.layx")
        .build();
    let session = session_on(&server, config.clone());
    session.load_scenario().unwrap();

    assert_eq!(
        server.network_file(),
        Some(config.network_path().to_string_lossy().into_owned())
    );
    assert_eq!(
        server.layout_file(),
        Some(config.layout_path().to_string_lossy().into_owned())
    );
    session.exit().unwrap();
}

#[test]
fn test_references_disconnect_after_exit() {
    let server = server_with_links(3);
    let session = session_on(&server, SessionConfig::default());
    let vissim = session.vissim().clone();
    let links = vissim.net().unwrap().links().unwrap();
    let utilities = server.utilities();

    session.exit().unwrap();

    assert!(links.count().unwrap_err().is_disconnected());
    assert!(matches!(
        links.view().map(|_| ()),
        Err(ComError::DisconnectedObject(_))
    ));
    assert!(vissim.hide_main_window(&utilities).unwrap_err().is_disconnected());
    assert!(server.native_calls().is_empty());
}

#[test]
fn test_drop_without_exit_leaves_server_running() {
    let server = server_with_links(2);
    {
        let session = session_on(&server, SessionConfig::default());
        session.run_continuous().unwrap();
    }
    assert!(!server.has_exited());
    assert_eq!(server.vissim().net().unwrap().links().unwrap().count().unwrap(), 2);
}
