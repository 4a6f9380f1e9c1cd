use ps2recomp::{ElfImage, Recompiler, RecompilerConfig};

const OPCODE_JAL: u32 = 0x03;
const OPCODE_ADDIU: u32 = 0x09;
const OPCODE_SPECIAL: u32 = 0x00;
const SPECIAL_JR: u32 = 0x08;
const NOP: u32 = 0;

const TEXT_ADDR: u32 = 0x0010_0000;
const TEXT_OFFSET: u32 = 0x100;

fn put_u16(bytes: &mut [u8], offset: usize, value: u16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

fn section_header(
    bytes: &mut [u8],
    table: usize,
    index: usize,
    name: u32,
    kind: u32,
    flags: u32,
    addr: u32,
    offset: u32,
    size: u32,
    link: u32,
    entsize: u32,
) {
    let base = table + index * 40;
    put_u32(bytes, base, name);
    put_u32(bytes, base + 4, kind);
    put_u32(bytes, base + 8, flags);
    put_u32(bytes, base + 12, addr);
    put_u32(bytes, base + 16, offset);
    put_u32(bytes, base + 20, size);
    put_u32(bytes, base + 24, link);
    put_u32(bytes, base + 36, entsize);
}

fn symbol(bytes: &mut [u8], table: usize, index: usize, name: u32, value: u32, size: u32, info: u8) {
    let base = table + index * 16;
    put_u32(bytes, base, name);
    put_u32(bytes, base + 4, value);
    put_u32(bytes, base + 8, size);
    bytes[base + 12] = info;
    put_u16(bytes, base + 14, 1); // defined in .text
}

// A minimal little-endian MIPS ELF32 with a .text section holding two
// functions (`start_fn` calls `helper_fn`) and a `_gp` symbol.
fn build_test_elf(text: &[u32]) -> Vec<u8> {
    let mut bytes = vec![0u8; 0x600];

    // Identification + header.
    bytes[..4].copy_from_slice(&[0x7f, b'E', b'L', b'F']);
    bytes[4] = 1; // ELFCLASS32
    bytes[5] = 1; // little endian
    bytes[6] = 1; // version
    put_u16(&mut bytes, 16, 2); // ET_EXEC
    put_u16(&mut bytes, 18, 8); // EM_MIPS
    put_u32(&mut bytes, 20, 1);
    put_u32(&mut bytes, 24, TEXT_ADDR); // entry
    put_u32(&mut bytes, 32, 0x500); // shoff
    put_u16(&mut bytes, 46, 40); // shentsize
    put_u16(&mut bytes, 48, 5); // shnum
    put_u16(&mut bytes, 50, 4); // shstrndx

    // .text contents.
    for (i, &word) in text.iter().enumerate() {
        put_u32(&mut bytes, TEXT_OFFSET as usize + i * 4, word);
    }

    // .shstrtab at 0x200: "\0.text\0.symtab\0.strtab\0.shstrtab\0"
    let shstrtab = b"\0.text\0.symtab\0.strtab\0.shstrtab\0";
    bytes[0x200..0x200 + shstrtab.len()].copy_from_slice(shstrtab);

    // .strtab at 0x400: "\0start_fn\0helper_fn\0_gp\0"
    let strtab = b"\0start_fn\0helper_fn\0_gp\0";
    bytes[0x400..0x400 + strtab.len()].copy_from_slice(strtab);

    // .symtab at 0x300: null, start_fn, helper_fn, _gp.
    symbol(&mut bytes, 0x300, 1, 1, TEXT_ADDR, 0x10, 0x12);
    symbol(&mut bytes, 0x300, 2, 10, TEXT_ADDR + 0x10, 0x10, 0x12);
    symbol(&mut bytes, 0x300, 3, 20, 0x0001_2345, 0, 0x11);

    // Section headers: null, .text, .symtab, .strtab, .shstrtab.
    let table = 0x500;
    section_header(
        &mut bytes,
        table,
        1,
        1,
        1, // PROGBITS
        0x6, // ALLOC | EXECINSTR
        TEXT_ADDR,
        TEXT_OFFSET,
        (text.len() * 4) as u32,
        0,
        0,
    );
    section_header(&mut bytes, table, 2, 7, 2, 0, 0, 0x300, 4 * 16, 3, 16);
    section_header(&mut bytes, table, 3, 15, 3, 0, 0, 0x400, strtab.len() as u32, 0, 0);
    section_header(
        &mut bytes,
        table,
        4,
        23,
        3,
        0,
        0,
        0x200,
        shstrtab.len() as u32,
        0,
        0,
    );

    bytes
}

fn test_text() -> Vec<u32> {
    vec![
        // start_fn: call helper_fn, then return.
        (OPCODE_JAL << 26) | ((TEXT_ADDR + 0x10) >> 2),
        NOP,
        (OPCODE_SPECIAL << 26) | (31 << 21) | SPECIAL_JR,
        NOP,
        // helper_fn: addiu $v0, $zero, 7; jr $ra.
        (OPCODE_ADDIU << 26) | (2 << 16) | 7,
        (OPCODE_SPECIAL << 26) | (31 << 21) | SPECIAL_JR,
        NOP,
        NOP,
    ]
}

#[test]
fn image_exposes_sections_symbols_and_functions() {
    let image = ElfImage::new(build_test_elf(&test_text())).unwrap();

    assert_eq!(image.entry_point(), TEXT_ADDR);
    assert_eq!(image.sections().len(), 5);

    let text = image
        .sections()
        .iter()
        .find(|s| s.name == ".text")
        .expect(".text present");
    assert!(text.is_code());
    assert!(!text.is_data());
    assert!(text.is_read_only());

    let symbols = image.symbols();
    assert!(symbols.iter().any(|s| s.name == "_gp" && s.address == 0x0001_2345));
    assert!(symbols.iter().any(|s| s.name == "start_fn" && s.is_function));

    let functions = image.functions();
    assert_eq!(functions.len(), 2);
    assert_eq!(functions[0], ("start_fn".to_string(), TEXT_ADDR, TEXT_ADDR + 0x10));
    assert_eq!(
        functions[1],
        ("helper_fn".to_string(), TEXT_ADDR + 0x10, TEXT_ADDR + 0x20)
    );
}

#[test]
fn image_reads_words_by_guest_address() {
    let text = test_text();
    let image = ElfImage::new(build_test_elf(&text)).unwrap();

    assert!(image.is_valid_address(TEXT_ADDR));
    assert!(image.is_valid_address(TEXT_ADDR + 0x1C));
    assert!(!image.is_valid_address(TEXT_ADDR + 0x20));
    assert!(!image.is_valid_address(0));

    assert_eq!(image.read_word(TEXT_ADDR).unwrap(), text[0]);
    assert_eq!(image.read_word(TEXT_ADDR + 0x10).unwrap(), text[4]);
    assert!(image.read_word(0x4000).is_err());
}

#[test]
fn pipeline_generates_sources_headers_and_registration() {
    let dir = tempfile::tempdir().unwrap();
    let elf_path = dir.path().join("game.elf");
    let out_path = dir.path().join("generated");
    std::fs::write(&elf_path, build_test_elf(&test_text())).unwrap();

    let config = RecompilerConfig::from_toml(&format!(
        r#"
        [input]
        path = {elf:?}

        [output]
        path = {out:?}
        single_file = true
        "#,
        elf = elf_path,
        out = out_path,
    ))
    .unwrap();

    let mut recompiler = Recompiler::new(config).unwrap();
    assert!(recompiler.symbols().iter().any(|s| s.name == "_gp"));
    assert!(recompiler.relocations().is_empty());

    let summary = recompiler.recompile().unwrap();
    recompiler.generate_output().unwrap();

    assert_eq!(summary.recompiled, 2);
    assert_eq!(summary.skipped, 0);

    let combined =
        std::fs::read_to_string(out_path.join("ps2_recompiled_functions.cpp")).unwrap();
    assert!(combined.contains("void start_fn_0x100000(uint8_t* rdram"));
    assert!(combined.contains("void helper_fn_0x100010(uint8_t* rdram"));
    assert!(combined.contains("helper_fn_0x100010(rdram, ctx, runtime);"));

    let registration =
        std::fs::read_to_string(out_path.join("register_functions.cpp")).unwrap();
    assert!(registration.contains("registerAllFunctions(PS2Runtime& runtime)"));
    assert!(registration.contains("runtime.registerFunction(0x100000, start_fn_0x100000);"));
    assert!(registration.contains("runtime.registerFunction(0x100010, helper_fn_0x100010);"));

    let header =
        std::fs::read_to_string(out_path.join("ps2_recompiled_functions.h")).unwrap();
    assert!(header.contains("void start_fn_0x100000(uint8_t* rdram"));
    assert!(header.contains("void helper_fn_0x100010(uint8_t* rdram"));

    assert!(out_path.join("ps2_recompiled_stubs.h").exists());
}

#[test]
fn stub_selectors_replace_function_bodies() {
    let dir = tempfile::tempdir().unwrap();
    let elf_path = dir.path().join("game.elf");
    let out_path = dir.path().join("generated");
    std::fs::write(&elf_path, build_test_elf(&test_text())).unwrap();

    let config = RecompilerConfig::from_toml(&format!(
        r#"
        [input]
        path = {elf:?}

        [output]
        path = {out:?}
        single_file = true

        [functions]
        stub = ["helper_fn"]
        skip = ["start_fn"]
        "#,
        elf = elf_path,
        out = out_path,
    ))
    .unwrap();

    let mut recompiler = Recompiler::new(config).unwrap();
    let summary = recompiler.recompile().unwrap();
    recompiler.generate_output().unwrap();

    assert_eq!(summary.recompiled, 0);
    assert_eq!(summary.stubs, 1);
    assert_eq!(summary.skipped, 1);

    let combined =
        std::fs::read_to_string(out_path.join("ps2_recompiled_functions.cpp")).unwrap();
    // helper_fn is not in the closed handler lists, so it falls back to
    // the TODO dispatcher; the skipped function always does.
    assert!(combined.contains("ps2_stubs::TODO_NAMED(\"helper_fn\", rdram, ctx, runtime);"));
    assert!(combined.contains("ps2_stubs::TODO_NAMED(\"start_fn\", rdram, ctx, runtime);"));
    // Wrappers fall back to the guest return path.
    assert!(combined.contains("ctx->pc = GPR_U32(ctx, 31);"));
}
