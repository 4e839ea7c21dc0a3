use anyhow::Result;
use nomenklatura::{Dataset, Error, NewEntity};

fn main() -> Result<()> {
    // Example program that calls the library API.
    // Configure the server via NOMENKLATURA_HOST / NOMENKLATURA_APIKEY or
    // a `[client]` section in ~/.nomenklatura.ini.
    let name = std::env::args().nth(1).unwrap_or_else(|| "companies".to_string());
    let dataset = Dataset::open(name)?;
    println!("dataset {} ({})", dataset, dataset.label().unwrap_or("no label"));

    for entity in dataset.entities(None).take(20) {
        let entity = entity?;
        if entity.is_alias() {
            println!("  {} -> {}", entity, entity.dereference()?);
        } else {
            println!("  {}", entity);
        }
    }

    let lookup = "Acme Corp.";
    match dataset.entity_by_name(lookup) {
        Ok(entity) => println!("{} has id {}", lookup, entity.id()),
        Err(Error::NoMatch(_)) => {
            let entity = dataset.create_entity(NewEntity::new(lookup).attribute("source", "demo"))?;
            println!("created {} with id {}", entity, entity.id());
        }
        Err(e) => return Err(e.into()),
    }

    Ok(())
}
