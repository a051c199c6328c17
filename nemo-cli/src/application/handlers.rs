use std::fs::File;
use std::path::PathBuf;

use nemo_core::error::Result;
use nemo_core::header::file_header::{COMPRESS_DATA, COMPRESS_HEADER1};
use nemo_core::pipeline::{load, save, LoadOptions, SaveOptions};
use nemo_core::{HashMapSchemaRegistry, InMemoryRepository};

pub fn handle_convert(input: PathBuf, output: PathBuf, compress: bool, strict: bool) -> Result<()> {
    let mut in_file = File::open(&input)?;
    let mut repository = InMemoryRepository::new();
    let registry = HashMapSchemaRegistry::new();
    let load_options = LoadOptions {
        strict,
        ..LoadOptions::default()
    };
    let report = load(&mut in_file, &mut repository, &registry, &load_options)?;

    let mut out_file = File::create(&output)?;
    let save_options = SaveOptions {
        compress,
        file_version: report.header.file_version,
        file_version2: report.header.file_version2,
        ck_version: report.header.ck_version,
        product_version: report.header.part1.as_ref().map(|p| p.product_version).unwrap_or(0),
        product_build: report.header.part1.as_ref().map(|p| p.product_build).unwrap_or(0),
        ..SaveOptions::default()
    };
    save(
        &mut out_file,
        &repository,
        &report.managers,
        &report.included_files,
        &registry,
        &save_options,
    )?;

    eprintln!(
        "convert: {} -> {} ({} objects, {} managers{})",
        input.display(),
        output.display(),
        repository.count(),
        report.managers.len(),
        if compress { ", compressed" } else { "" }
    );
    Ok(())
}

pub fn handle_inspect(input: PathBuf) -> Result<()> {
    let mut in_file = File::open(&input)?;
    let mut repository = InMemoryRepository::new();
    let registry = HashMapSchemaRegistry::new();
    let report = load(&mut in_file, &mut repository, &registry, &LoadOptions::default())?;

    let header = &report.header;
    println!("file_version:      {}", header.file_version);
    println!("file_version2:      {}", header.file_version2);
    println!("ck_version:         {:#x}", header.ck_version);
    println!(
        "file_write_mode:    {:#x} (header1={}, data={})",
        header.file_write_mode,
        header.file_write_mode & COMPRESS_HEADER1 != 0,
        header.file_write_mode & COMPRESS_DATA != 0,
    );
    println!("manager_count:      {}", header.manager_count());
    println!("object_count:       {}", header.object_count());
    println!("max_id_saved:       {}", header.max_id_saved());
    println!("objects loaded:     {}", repository.count());
    println!("included files:     {}", report.included_files.len());
    println!(
        "resolution stats:   total={} resolved={} unresolved={} ambiguous={}",
        report.stats.total, report.stats.resolved, report.stats.unresolved, report.stats.ambiguous
    );
    if !report.unresolved.is_empty() {
        println!("unresolved references:");
        for r in &report.unresolved {
            println!("  file_id={} class_id={:#x} name={:?}", r.file_id, r.class_id, r.name);
        }
    }
    Ok(())
}
