use crate::{
    command::Command, config::Config, directory::Transaction, testing, value, Simulation, State,
};
use color_eyre::eyre;
use itertools::Itertools;
use std::collections::HashMap;

const NUM_PROCESSORS: usize = 2;
const NUM_ADDRS: u64 = 3;

fn alphabet() -> Vec<Command> {
    let mut commands = Vec::new();
    for processor in 1..=NUM_PROCESSORS {
        for addr in 0..NUM_ADDRS {
            commands.push(Command::Read { processor, addr });
            commands.push(Command::Write {
                processor,
                addr,
                value: 100 * processor as u64 + addr,
            });
        }
    }
    commands
}

/// Every interleaving of four accesses on a two-line cache keeps the
/// invariants, and every read returns the last value written.
#[test]
fn test_all_short_sequences_are_coherent() -> eyre::Result<()> {
    testing::init_logging();
    let config = Config {
        num_processors: NUM_PROCESSORS,
        cache_size: 2,
        memory_size: NUM_ADDRS as usize,
    };

    for sequence in std::iter::repeat(alphabet())
        .take(4)
        .multi_cartesian_product()
    {
        let sim = Simulation::new(&config)?;
        let mut last_written: HashMap<u64, value> = HashMap::new();
        for command in &sequence {
            let response = sim.execute(command)?;
            match *command {
                Command::Read { addr, .. } => {
                    let want = last_written.get(&addr).copied().unwrap_or(0);
                    assert_eq!(
                        response.value, want,
                        "stale read of {addr} in {sequence:?}"
                    );
                }
                Command::Write { addr, value, .. } => {
                    last_written.insert(addr, value);
                }
            }
            if let Err(violation) = sim.check_invariants() {
                panic!("{violation} after {command} in {sequence:?}");
            }
        }
    }
    Ok(())
}

#[test]
fn test_write_then_read_hits() -> eyre::Result<()> {
    let sim = Simulation::new(&Config {
        num_processors: 3,
        cache_size: 3,
        memory_size: 16,
    })?;
    for (processor, addr) in (1..=3).cartesian_product(0..16) {
        let value = 1000 + addr;
        sim.write(processor, addr, value)?;
        assert_eq!(sim.read(processor, addr)?, (value, Transaction::ReadHit));
    }
    Ok(())
}

#[test]
fn test_remote_read_sees_write_and_shares() -> eyre::Result<()> {
    let sim = Simulation::new(&Config {
        num_processors: 4,
        cache_size: 2,
        memory_size: 8,
    })?;
    for (writer, reader) in (1..=4).cartesian_product(1..=4) {
        if writer == reader {
            continue;
        }
        let value = (writer * 10 + reader) as u64;
        sim.write(writer, 5, value)?;
        // the write left a single valid copy
        assert_eq!(
            sim.directory().lock().holders(5),
            vec![(writer, State::Modified)]
        );
        assert_eq!(sim.read(reader, 5)?, (value, Transaction::ReadHit));
        let holders = sim.directory().lock().holders(5);
        assert!(holders.contains(&(writer, State::Shared)));
        assert!(holders.contains(&(reader, State::Shared)));
        assert_eq!(sim.memory().lock().peek(5)?, value);
    }
    Ok(())
}

#[test]
fn test_fifo_eviction_order() -> eyre::Result<()> {
    for capacity in 1..=4 {
        let sim = Simulation::new(&Config {
            num_processors: 1,
            cache_size: capacity,
            memory_size: 16,
        })?;
        let addrs: Vec<u64> = (0..=capacity as u64).collect();
        for &addr in &addrs {
            sim.write(1, addr, 500 + addr)?;
        }
        let processor = sim.processor(1)?;
        let cache = processor.cache().lock();
        assert!(cache.search(addrs[0]).is_none(), "capacity {capacity}");
        for &addr in &addrs[1..] {
            assert!(cache.lookup(addr).is_some(), "capacity {capacity}");
        }
        assert_eq!(sim.memory().lock().peek(addrs[0])?, 500);
        assert_eq!(cache.stats().evictions, 1);
    }
    Ok(())
}
