use std::collections::BTreeSet;
use std::path::Path;

use cathode_core::cpu::{Cpu, I8080};
use cathode_cpu_validation::{I8080CpuState, I8080TestCase, TracingBus, load_cases, vector_files};

fn run_test_case(tc: &I8080TestCase) -> Option<String> {
    let mut cpu = I8080::new();
    let mut bus = TracingBus::new();

    tc.initial.apply(&mut cpu);
    bus.load_ram(&tc.initial.ram);
    bus.load_ports(&tc.ports);

    let cycles = match cpu.step(&mut bus) {
        Ok(cycles) => cycles,
        Err(e) => return Some(format!("{}: {}", tc.name, e)),
    };

    let fs = &tc.final_state;
    let got = I8080CpuState::capture(&cpu);

    macro_rules! check {
        ($field:ident, $name:expr) => {
            if got.$field != fs.$field {
                return Some(format!(
                    "{}: {} (got 0x{:X} exp 0x{:X})",
                    tc.name, $name, got.$field as u64, fs.$field as u64
                ));
            }
        };
    }

    check!(a, "A");
    check!(f, "F");
    check!(b, "B");
    check!(c, "C");
    check!(d, "D");
    check!(e, "E");
    check!(h, "H");
    check!(l, "L");
    check!(sp, "SP");
    check!(pc, "PC");
    if fs.inte.is_some() && got.inte != fs.inte {
        return Some(format!("{}: INTE (got {:?} exp {:?})", tc.name, got.inte, fs.inte));
    }

    for &(addr, expected) in &fs.ram {
        if bus.memory[addr as usize] != expected {
            return Some(format!(
                "{}: RAM[0x{:04X}] (got 0x{:02X} exp 0x{:02X})",
                tc.name, addr, bus.memory[addr as usize], expected
            ));
        }
    }

    let expected_writes: Vec<_> = tc.ports.iter().filter(|p| p.2.starts_with('w')).collect();
    let writes = bus.port_writes();
    if writes.len() != expected_writes.len()
        || writes.iter().zip(&expected_writes).any(|(got, exp)| got.1 != exp.1)
    {
        return Some(format!("{}: port writes (got {:?} exp {:?})", tc.name, writes, expected_writes));
    }

    if cycles as usize != tc.cycles.len() {
        return Some(format!(
            "{}: cycles (got {} exp {})",
            tc.name,
            cycles,
            tc.cycles.len()
        ));
    }

    None
}

#[test]
fn test_all_i8080_opcodes() {
    let test_dir = Path::new("test_data/8080/v1");
    if !test_dir.exists() {
        eprintln!(
            "No SingleStepTests data at {}, skipping. Fetch the 8080 vectors or run gen_i8080_tests.",
            test_dir.display()
        );
        return;
    }

    let files = vector_files(test_dir).expect("Failed to read test directory");

    let mut total_tests = 0;
    let mut failed_tests = 0;
    let mut failed_files = BTreeSet::new();
    let mut first_failures: Vec<String> = Vec::new();

    for path in &files {
        let tests: Vec<I8080TestCase> =
            load_cases(path).unwrap_or_else(|e| panic!("Failed to parse {:?}: {}", path, e));
        assert!(!tests.is_empty(), "Test file {:?} is empty", path);

        for tc in &tests {
            if let Some(err) = run_test_case(tc) {
                failed_tests += 1;
                if failed_files.insert(path.clone()) && first_failures.len() < 50 {
                    first_failures.push(err);
                }
            }
        }
        total_tests += tests.len();
    }

    eprintln!(
        "\n8080 SingleStepTests: {} passed, {} failed across {} files",
        total_tests - failed_tests,
        failed_tests,
        files.len()
    );
    for err in &first_failures {
        eprintln!("  {}", err);
    }

    if failed_tests > 0 {
        panic!(
            "{} tests failed across {} files (out of {} tests)",
            failed_tests,
            failed_files.len(),
            total_tests
        );
    }
}
