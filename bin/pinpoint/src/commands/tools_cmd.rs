use pinpoint_tools::ToolRegistry;
use serde_json::Value;

/// List all tools served by `pinpoint serve`.
pub async fn list() -> anyhow::Result<()> {
    let registry = ToolRegistry::with_defaults();
    let schemas = registry.get_tool_schemas();

    println!();
    println!("🔧 Tools ({} total)", schemas.len());
    println!();
    for schema in &schemas {
        let name = schema["name"].as_str().unwrap_or("");
        let desc = schema["description"].as_str().unwrap_or("");
        let short_desc: String = desc.chars().take(60).collect();
        let ellipsis = if desc.chars().count() > 60 { "..." } else { "" };
        println!("  {:<22} {}{}", name, short_desc, ellipsis);
    }
    println!();
    Ok(())
}

/// Show detailed info for a specific tool.
pub async fn info(tool_name: &str) -> anyhow::Result<()> {
    let registry = ToolRegistry::with_defaults();
    let schemas = registry.get_tool_schemas();

    let Some(schema) = schemas.iter().find(|s| s["name"].as_str() == Some(tool_name)) else {
        println!("❌ Unknown tool: {}", tool_name);
        println!("   Run `pinpoint tools list` to see available tools.");
        return Ok(());
    };

    println!();
    println!("🔧 {}", tool_name);
    println!();
    println!("  Description: {}", schema["description"].as_str().unwrap_or(""));
    println!();

    let params = &schema["inputSchema"];
    let required: Vec<&str> = params
        .get("required")
        .and_then(Value::as_array)
        .map(|arr| arr.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    match params.get("properties").and_then(Value::as_object) {
        Some(props) if !props.is_empty() => {
            println!("  Parameters:");
            for (name, prop) in props {
                let ty = prop["type"].as_str().unwrap_or("any");
                let marker = if required.contains(&name.as_str()) { "*" } else { " " };
                let desc = prop["description"].as_str().unwrap_or("");
                println!("    {}{:<14} {:<8} {}", marker, name, ty, desc);
            }
            println!();
            println!("  * required");
        }
        _ => println!("  No parameters."),
    }
    println!();
    Ok(())
}
