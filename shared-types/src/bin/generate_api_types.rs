use shared_types::*;
use std::fs;
use std::path::Path;
use ts_rs::TS;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Generate TypeScript definitions for the admin panel's lead API bindings
    let mut types = Vec::new();

    // Registry types
    types.push(clean_type(LeadStage::export_to_string()?));
    types.push(clean_type(LeadPriority::export_to_string()?));

    // Lead types
    types.push(clean_type(AssigneeSummary::export_to_string()?));
    types.push(clean_type(Lead::export_to_string()?));
    types.push(clean_type(CreateLeadRequest::export_to_string()?));
    types.push(clean_type(UpdateLeadRequest::export_to_string()?));
    types.push(clean_type(AssignLeadRequest::export_to_string()?));

    // List types
    types.push(clean_type(ListLeadsQuery::export_to_string()?));
    types.push(clean_type(Pagination::export_to_string()?));
    types.push(clean_type(LeadsResponse::export_to_string()?));

    let output_dir = Path::new("../web/src/api-types");
    fs::create_dir_all(output_dir)?;

    let output_path = output_dir.join("leads.ts");
    let output = types.join("\n\n");

    fs::write(&output_path, output)?;
    println!("Generated TypeScript types in {}", output_path.display());

    Ok(())
}

fn clean_type(mut type_def: String) -> String {
    type_def.retain(|c| c != '\r');

    // Lead imports LeadStage, LeadPriority and AssigneeSummary; those live in the same file
    let filtered: Vec<&str> = type_def
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.starts_with("import type")
                && !trimmed.starts_with("// This file was generated")
                && !trimmed.starts_with("/* This file was generated")
        })
        .collect();

    let result = filtered.join("\n").trim().to_string();
    if result.is_empty() {
        result
    } else {
        format!("{}\n", result)
    }
}
