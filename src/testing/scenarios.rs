use super::state::{self, empty, line};
use crate::{
    cache::State::{Exclusive, Invalid, Modified, Shared},
    config::Config,
    directory::Transaction,
    error::Error,
    testing, Simulation,
};
use color_eyre::eyre;
use std::collections::BTreeMap;
use pretty_assertions_sorted as diff;

fn session(num_processors: usize, cache_size: usize, memory_size: usize) -> eyre::Result<Simulation> {
    testing::init_logging();
    let sim = Simulation::new(&Config {
        num_processors,
        cache_size,
        memory_size,
    })?;
    Ok(sim)
}

#[test]
fn test_write_read_write_two_processors() -> eyre::Result<()> {
    let sim = session(2, 2, 10)?;

    assert_eq!(sim.write(1, 0, 100)?, Transaction::WriteMiss);
    diff::assert_eq!(
        state::Simulation::from(&sim).caches,
        BTreeMap::from([
            (1, vec![line(0, 100, Modified), empty()]),
            (2, vec![empty(), empty()]),
        ])
    );

    assert_eq!(sim.read(2, 0)?, (100, Transaction::ReadHit));
    diff::assert_eq!(
        state::Simulation::from(&sim).caches,
        BTreeMap::from([
            (1, vec![line(0, 100, Shared), empty()]),
            (2, vec![line(0, 100, Shared), empty()]),
        ])
    );

    assert_eq!(sim.write(1, 0, 200)?, Transaction::WriteHit);
    let have = state::Simulation::from(&sim);
    diff::assert_eq!(
        have.caches,
        BTreeMap::from([
            (1, vec![line(0, 200, Modified), empty()]),
            (2, vec![line(0, 100, Invalid), empty()]),
        ])
    );
    // the first write-back happened on the remote read
    assert_eq!(have.memory[0], 100);
    sim.check_invariants()?;
    Ok(())
}

#[test]
fn test_capacity_one_evicts_modified_line() -> eyre::Result<()> {
    let sim = session(1, 1, 10)?;
    assert_eq!(sim.write(1, 5, 55)?, Transaction::WriteMiss);
    assert_eq!(sim.memory().lock().peek(5)?, 0);

    assert_eq!(sim.write(1, 6, 66)?, Transaction::WriteMiss);
    assert_eq!(sim.memory().lock().peek(5)?, 55);
    diff::assert_eq!(
        state::Simulation::from(&sim).caches[&1],
        vec![line(6, 66, Modified)]
    );

    // the evicted value is served from memory again
    assert_eq!(sim.read(1, 5)?, (55, Transaction::ReadMiss));
    assert_eq!(sim.memory().lock().peek(6)?, 66);
    Ok(())
}

#[test]
fn test_exclusive_read_is_downgraded_by_remote_read() -> eyre::Result<()> {
    let sim = session(3, 2, 8)?;
    assert_eq!(sim.read(1, 4)?, (0, Transaction::ReadMiss));
    diff::assert_eq!(
        state::Simulation::from(&sim).caches[&1],
        vec![line(4, 0, Exclusive), empty()]
    );

    assert_eq!(sim.read(3, 4)?, (0, Transaction::ReadHit));
    assert_eq!(sim.read(2, 4)?, (0, Transaction::ReadMiss));
    diff::assert_eq!(
        sim.directory().lock().holders(4),
        vec![(1, Shared), (2, Shared), (3, Shared)]
    );

    // upgrading a shared line invalidates every other copy
    assert_eq!(sim.write(2, 4, 9)?, Transaction::WriteHit);
    diff::assert_eq!(sim.directory().lock().holders(4), vec![(2, Modified)]);
    sim.check_invariants()?;
    Ok(())
}

#[test]
fn test_invalidated_line_misses_on_write() -> eyre::Result<()> {
    let sim = session(2, 2, 8)?;
    sim.write(1, 3, 30)?;
    sim.write(2, 3, 31)?;
    assert_eq!(sim.write(1, 3, 32)?, Transaction::WriteMiss);
    diff::assert_eq!(
        state::Simulation::from(&sim).caches,
        BTreeMap::from([
            (1, vec![line(3, 32, Modified), empty()]),
            (2, vec![line(3, 31, Invalid), empty()]),
        ])
    );
    // the stale value of processor 2 never reaches memory
    assert_eq!(sim.memory().lock().peek(3)?, 0);
    sim.check_invariants()?;
    Ok(())
}

#[test]
fn test_errors_do_not_mutate() -> eyre::Result<()> {
    let sim = session(2, 1, 4)?;
    sim.write(1, 0, 1)?;
    let before = state::Simulation::from(&sim);

    assert!(matches!(
        sim.read(2, 4),
        Err(Error::OutOfRange { addr: 4, size: 4 })
    ));
    assert!(matches!(
        sim.write(2, 7, 1),
        Err(Error::OutOfRange { addr: 7, size: 4 })
    ));
    assert!(matches!(sim.write(3, 0, 1), Err(Error::UnknownProcessor(3))));

    diff::assert_eq!(state::Simulation::from(&sim), before);
    Ok(())
}
