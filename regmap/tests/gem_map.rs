// Licensed under the Apache-2.0 license

//! End-to-end test over a small optohybrid-style register map: two OH
//! elements, each with three VFAT frontend chips, each with a PULSE
//! register, plus a few top-level control registers.

use memsvc::{MemSvc, MemSvcError, Ram};
use regmap::generators::{
    collect_addresses_in, count_registers, count_registers_in, AddressCollector, IndexGenerator,
    RegisterGenerator,
};
use regmap::schema::{Access, AddressSpace, ElementDef, LeafDef, MapDef, NodeDef, RepeatDef};
use regmap::{RegError, Register};

/// Memory service double that counts bus transactions.
#[derive(Default)]
struct CountingMem {
    ram: Ram,
    reads: usize,
    writes: usize,
}

impl MemSvc for CountingMem {
    fn read(&mut self, addr: u32, count: usize) -> Result<Vec<u32>, MemSvcError> {
        self.reads += 1;
        self.ram.read(addr, count)
    }

    fn write(&mut self, addr: u32, data: &[u32]) -> Result<(), MemSvcError> {
        self.writes += 1;
        self.ram.write(addr, data)
    }
}

/// OH[i].VFAT[j].PULSE sits at byte address 0x1000 + i*0x100 + j*0x10.
fn gem_map() -> MapDef {
    MapDef {
        name: "GEM_AMC".to_string(),
        space: AddressSpace { window: 0 },
        children: vec![
            NodeDef::Leaf(LeafDef {
                name: "CTRL".to_string(),
                offset: 0,
                mask: u32::MAX,
                access: Access::Rw,
            }),
            NodeDef::Leaf(LeafDef {
                name: "STATUS".to_string(),
                offset: 1,
                mask: 0x0000_ffff,
                access: Access::Ro,
            }),
            NodeDef::Leaf(LeafDef {
                name: "RESET".to_string(),
                offset: 2,
                mask: u32::MAX,
                access: Access::Wo,
            }),
            NodeDef::Repeat(RepeatDef {
                name: "OH".to_string(),
                offset: 0x400,
                stride: 0x40,
                count: 2,
                element: ElementDef::Group {
                    children: vec![NodeDef::Repeat(RepeatDef {
                        name: "VFAT".to_string(),
                        offset: 0,
                        stride: 4,
                        count: 3,
                        element: ElementDef::Group {
                            children: vec![NodeDef::Leaf(LeafDef {
                                name: "PULSE".to_string(),
                                offset: 0,
                                mask: 0x0000_00ff,
                                access: Access::Rw,
                            })],
                        },
                    })],
                },
            }),
        ],
    }
}

fn pulse_at<'t>(tree: &'t regmap::Tree<Register>, i: usize, j: usize) -> &'t Register {
    tree.get("OH")
        .and_then(|oh| oh.at(i))
        .and_then(|oh| oh.get("VFAT"))
        .and_then(|vfat| vfat.at(j))
        .and_then(|vfat| vfat.get("PULSE"))
        .and_then(|n| n.leaf())
        .unwrap()
}

#[test]
fn test_pulse_addresses() {
    let tree = gem_map().instantiate(&mut RegisterGenerator);
    for i in 0..2 {
        for j in 0..3 {
            let expected = 0x1000 + (i as u32) * 0x100 + (j as u32) * 0x10;
            assert_eq!(pulse_at(&tree, i, j).addr(), expected);
        }
    }
}

#[test]
fn test_pulse_write_is_isolated() {
    let map = gem_map();
    let tree = map.instantiate(&mut RegisterGenerator);
    let mut mem = Ram::new();

    pulse_at(&tree, 1, 2).write(&mut mem, 0x12).unwrap();
    assert_eq!(pulse_at(&tree, 1, 2).read(&mut mem).unwrap(), 0x12);

    for i in 0..2 {
        for j in 0..3 {
            if (i, j) != (1, 2) {
                assert_eq!(pulse_at(&tree, i, j).read(&mut mem).unwrap(), 0);
            }
        }
    }
}

#[test]
fn test_traversal_order_is_generator_independent() {
    let map = gem_map();

    let registers = map.instantiate(&mut RegisterGenerator);
    let indices = map.instantiate(&mut IndexGenerator::default());
    let mut sink = Vec::new();
    let addresses = map.instantiate(&mut AddressCollector::new(&mut sink));

    fn paths<T>(tree: &regmap::Tree<T>) -> Vec<String> {
        tree.leaves().into_iter().map(|(p, _)| p).collect()
    }
    let reference = paths(&registers);
    assert_eq!(paths(&indices), reference);
    assert_eq!(paths(&addresses), reference);
}

#[test]
fn test_index_assignment_over_oh_subtree() {
    let map = gem_map();
    let mut gen = IndexGenerator::default();
    let oh = map.instantiate_subtree("OH", &mut gen).unwrap();
    assert_eq!(gen.count, 6);

    let leaves = oh.leaves();
    let expected_paths = [
        "[0].VFAT[0].PULSE",
        "[0].VFAT[1].PULSE",
        "[0].VFAT[2].PULSE",
        "[1].VFAT[0].PULSE",
        "[1].VFAT[1].PULSE",
        "[1].VFAT[2].PULSE",
    ];
    for (index, (path, &value)) in leaves.iter().enumerate() {
        assert_eq!(path, expected_paths[index]);
        assert_eq!(value, index);
    }

    // A fresh generator over the same schema reproduces the assignment.
    let again = map
        .instantiate_subtree("OH", &mut IndexGenerator::default())
        .unwrap();
    assert_eq!(oh, again);
}

#[test]
fn test_register_counts() {
    let map = gem_map();
    assert_eq!(count_registers(&map), 9);
    assert_eq!(count_registers_in(&map, "OH"), Some(6));
    assert_eq!(count_registers_in(&map, "OH[0]"), Some(3));
    assert_eq!(count_registers_in(&map, "OH[0].VFAT[1]"), Some(1));
}

#[test]
fn test_address_flattening_over_oh_subtree() {
    let map = gem_map();
    let mut addrs = Vec::new();
    assert!(collect_addresses_in(&map, "OH", &mut addrs));
    assert_eq!(
        addrs,
        vec![0x1000, 0x1010, 0x1020, 0x1100, 0x1110, 0x1120]
    );
}

#[test]
fn test_codec_cost_contract() {
    let tree = gem_map().instantiate(&mut RegisterGenerator);
    let mut mem = CountingMem::default();

    // Full-word write: one bus write, no read.
    let ctrl = tree.get("CTRL").and_then(|n| n.leaf()).unwrap();
    ctrl.write(&mut mem, 0xcafe_f00d).unwrap();
    assert_eq!((mem.reads, mem.writes), (0, 1));

    // Masked write: read-modify-write, one of each.
    pulse_at(&tree, 0, 0).write(&mut mem, 0x7f).unwrap();
    assert_eq!((mem.reads, mem.writes), (1, 2));

    // Read: one bus read.
    let status = tree.get("STATUS").and_then(|n| n.leaf()).unwrap();
    status.read(&mut mem).unwrap();
    assert_eq!((mem.reads, mem.writes), (2, 2));
}

#[test]
fn test_failures_never_touch_hardware() {
    let tree = gem_map().instantiate(&mut RegisterGenerator);
    let mut mem = CountingMem::default();

    let status = tree.get("STATUS").and_then(|n| n.leaf()).unwrap();
    assert_eq!(
        status.write(&mut mem, 1),
        Err(RegError::NotWritable { addr: 0x4 })
    );

    let reset = tree.get("RESET").and_then(|n| n.leaf()).unwrap();
    assert_eq!(reset.read(&mut mem), Err(RegError::NotReadable { addr: 0x8 }));

    let pulse = pulse_at(&tree, 0, 0);
    assert_eq!(
        pulse.write(&mut mem, 0x100),
        Err(RegError::ValueTooWide {
            value: 0x100,
            addr: 0x1000,
            mask: 0x0000_00ff,
        })
    );

    assert_eq!((mem.reads, mem.writes), (0, 0));
}
