use std::collections::HashMap;

use ps2recomp::decode;
use ps2recomp::elf::{Section, SectionFlag, SectionKind};
use ps2recomp::recompiler::{discover_entry_points, reslice_entry_functions};
use ps2recomp::{Function, Instruction};

const OPCODE_JAL: u32 = 0x03;
const NOP: u32 = 0;

fn code_section(address: u32, size: u32) -> Section {
    Section {
        name: ".text".into(),
        address,
        size,
        offset: 0,
        flags: SectionFlag::Alloc | SectionFlag::ExecInstr,
        kind: SectionKind::Progbits,
    }
}

fn data_section(address: u32, size: u32) -> Section {
    Section {
        name: ".data".into(),
        address,
        size,
        offset: 0,
        flags: SectionFlag::Alloc | SectionFlag::Write,
        kind: SectionKind::Progbits,
    }
}

fn recompiled(name: &str, start: u32, end: u32) -> Function {
    Function {
        name: name.into(),
        start,
        end,
        is_recompiled: true,
        ..Function::default()
    }
}

fn nops(start: u32, count: u32) -> Vec<Instruction> {
    (0..count).map(|i| decode(start + i * 4, NOP)).collect()
}

fn jal(target: u32) -> u32 {
    (OPCODE_JAL << 26) | (target >> 2)
}

fn decode_words(start: u32, words: &[u32]) -> Vec<Instruction> {
    words
        .iter()
        .enumerate()
        .map(|(i, &raw)| decode(start + (i as u32) * 4, raw))
        .collect()
}

#[test]
fn discovered_entries_split_at_the_nearest_boundary() {
    let mut functions = vec![
        recompiled("alpha", 0x1000, 0x1040),
        recompiled("beta", 0x2000, 0x2010),
    ];
    let mut decoded = HashMap::new();
    decoded.insert(0x1000, nops(0x1000, 16));
    decoded.insert(
        0x2000,
        decode_words(0x2000, &[jal(0x1010), NOP, jal(0x1020), NOP]),
    );
    let sections = [code_section(0x1000, 0x2000)];

    let discovered =
        discover_entry_points(&mut functions, &mut decoded, &sections, &mut |_| None);
    assert_eq!(discovered, 2);

    let entry_1010 = functions
        .iter()
        .find(|f| f.name == "entry_1010")
        .expect("entry_1010 exists");
    let entry_1020 = functions
        .iter()
        .find(|f| f.name == "entry_1020")
        .expect("entry_1020 exists");

    // The earlier entry is bounded by the later one, not by its host.
    assert_eq!(entry_1010.end, 0x1020);
    assert_eq!(entry_1020.end, 0x1040);
    assert!(entry_1010.is_recompiled);

    assert_eq!(decoded[&0x1010].len(), 4);
    assert_eq!(decoded[&0x1020].len(), 8);
    assert_eq!(decoded[&0x1010][0].address, 0x1010);

    // The host keeps its own slice.
    assert_eq!(decoded[&0x1000].len(), 16);

    // Discovery is a fixed point: a second pass finds nothing.
    let again = discover_entry_points(&mut functions, &mut decoded, &sections, &mut |_| None);
    assert_eq!(again, 0);
}

#[test]
fn entries_to_the_same_function_stay_labels() {
    // A static jump inside its own function must not become an entry.
    let mut functions = vec![recompiled("self_jump", 0x1000, 0x1020)];
    let mut decoded = HashMap::new();
    decoded.insert(
        0x1000,
        decode_words(0x1000, &[jal(0x1008), NOP, NOP, NOP, NOP, NOP, NOP, NOP]),
    );
    let sections = [code_section(0x1000, 0x1000)];

    let discovered =
        discover_entry_points(&mut functions, &mut decoded, &sections, &mut |_| None);
    assert_eq!(discovered, 0);
    assert_eq!(functions.len(), 1);
}

#[test]
fn non_executable_targets_are_ignored() {
    let mut functions = vec![recompiled("caller", 0x1000, 0x1010)];
    let mut decoded = HashMap::new();
    decoded.insert(0x1000, decode_words(0x1000, &[jal(0x8000), NOP, NOP, NOP]));
    let sections = [code_section(0x1000, 0x1000), data_section(0x8000, 0x1000)];

    let discovered =
        discover_entry_points(&mut functions, &mut decoded, &sections, &mut |_| None);
    assert_eq!(discovered, 0);
}

#[test]
fn external_targets_use_the_decode_hook() {
    let mut functions = vec![
        recompiled("caller", 0x1000, 0x1010),
        recompiled("sentinel", 0x2000, 0x2008),
    ];
    let mut decoded = HashMap::new();
    decoded.insert(0x1000, decode_words(0x1000, &[jal(0x1800), NOP, NOP, NOP]));
    decoded.insert(0x2000, nops(0x2000, 2));
    let sections = [code_section(0x1000, 0x2000)];

    let mut hook_calls = 0;
    let discovered = discover_entry_points(
        &mut functions,
        &mut decoded,
        &sections,
        &mut |function| {
            hook_calls += 1;
            assert_eq!(function.start, 0x1800);
            // The tentative end is the next known boundary.
            assert_eq!(function.end, 0x2000);
            Some((0x1810, nops(0x1800, 4)))
        },
    );

    assert_eq!(discovered, 1);
    assert_eq!(hook_calls, 1);
    let entry = functions.iter().find(|f| f.name == "entry_1800").unwrap();
    assert_eq!(entry.end, 0x1810);
    assert_eq!(decoded[&0x1800].len(), 4);
}

#[test]
fn reslice_trims_entries_after_late_discovery() {
    // entry_1010 was sliced before entry_1020 existed; reslicing must
    // shorten it to the new boundary.
    let host = recompiled("host", 0x1000, 0x1040);
    let mut entry_a = recompiled("entry_1010", 0x1010, 0x1040);
    entry_a.end = 0x1040;
    let entry_b = recompiled("entry_1020", 0x1020, 0x1040);

    let mut functions = vec![host, entry_a, entry_b];
    let mut decoded = HashMap::new();
    decoded.insert(0x1000, nops(0x1000, 16));
    decoded.insert(0x1010, nops(0x1010, 12));
    decoded.insert(0x1020, nops(0x1020, 8));

    let resliced = reslice_entry_functions(&mut functions, &mut decoded);
    assert!(resliced >= 1);

    let entry_a = functions.iter().find(|f| f.name == "entry_1010").unwrap();
    assert_eq!(entry_a.end, 0x1020);
    assert_eq!(decoded[&0x1010].len(), 4);

    // Reslicing again is a no-op.
    let again = reslice_entry_functions(&mut functions, &mut decoded);
    assert_eq!(again, 0);
}

#[test]
fn reslice_keeps_entries_without_a_containing_function() {
    let entry = recompiled("entry_3000", 0x3000, 0x3010);
    let mut functions = vec![entry];
    let mut decoded = HashMap::new();
    decoded.insert(0x3000, nops(0x3000, 4));

    let resliced = reslice_entry_functions(&mut functions, &mut decoded);
    assert_eq!(resliced, 0);
    assert_eq!(functions[0].end, 0x3010);
    assert_eq!(decoded[&0x3000].len(), 4);
}
