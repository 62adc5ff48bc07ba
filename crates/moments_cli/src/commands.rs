use anyhow::{Context, Result};
use moments_core::{
    core_version, ping, DirMomentStore, GeoPoint, ImageSource, MapRegion, Moment, MomentId,
    MomentRecord, MomentService, StoreError,
};
use std::path::PathBuf;

type Service = MomentService<DirMomentStore>;

const PREVIEW_CHARS: usize = 48;

pub fn add(
    service: &Service,
    photo: PathBuf,
    description: String,
    coordinates: Option<(f64, f64)>,
    move_source: bool,
) -> Result<()> {
    let image = if move_source {
        ImageSource::MoveFrom(photo)
    } else {
        ImageSource::CopyFrom(photo)
    };
    let moment = service.capture(image, &description, coordinates)?;
    println!("{}", moment.id);
    Ok(())
}

pub fn list(service: &Service, json: bool) -> Result<()> {
    let moments = service.list()?;
    if json {
        let records = moments.iter().map(MomentRecord::from).collect::<Vec<_>>();
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if moments.is_empty() {
        println!("No moments found. Yet!");
        return Ok(());
    }
    for moment in &moments {
        println!(
            "{:<18}  {:>13}  {:<24}  {}",
            moment.id,
            moment.created_at,
            location_label(moment),
            preview(&moment.description)
        );
    }
    Ok(())
}

pub fn show(service: &Service, id: &str) -> Result<()> {
    let (moment, region) = service.detail(id)?;
    println!("id:          {}", moment.id);
    println!("created_at:  {}", moment.created_at);
    println!("location:    {}", location_label(&moment));
    println!("photo:       {}", service.store().photo_path(&moment).display());
    println!("description: {}", moment.description);
    if let Some(region) = region {
        println!("map:         {}", region_label(&region));
    }
    Ok(())
}

pub fn inspect(service: &Service, id: &str) -> Result<()> {
    let id = MomentId::parse(id.trim()).with_context(|| format!("`{id}` is not a moment id"))?;
    match service.store().inspect(&id) {
        Ok(moment) => println!("{}: visible ({})", moment.id, location_label(&moment)),
        Err(StoreError::CorruptRecord { id, reason }) => {
            println!("{id}: hidden ({}: {reason})", reason.code())
        }
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

pub fn delete(service: &Service, id: &str) -> Result<()> {
    match service.delete(id) {
        Ok(()) => {
            println!("deleted {id}");
            Ok(())
        }
        Err(StoreError::DeleteFailed {
            id,
            remaining,
            source,
        }) => {
            for path in &remaining {
                eprintln!("remaining: {}", path.display());
            }
            Err(anyhow::Error::new(source).context(format!(
                "delete of {id} incomplete; run `moments sweep` to finish cleanup"
            )))
        }
        Err(err) => Err(err.into()),
    }
}

pub fn purge(service: &Service, id: &str) -> Result<()> {
    let id = MomentId::parse(id.trim()).with_context(|| format!("`{id}` is not a moment id"))?;
    service.store().purge(&id)?;
    println!("purged {id}");
    Ok(())
}

pub fn grid(service: &Service, columns: usize) -> Result<()> {
    let grid = service.gallery(columns)?;
    if grid.is_empty() {
        println!("No moments found. Yet!");
        return Ok(());
    }
    for row in grid.rows() {
        let cells = row
            .iter()
            .map(|moment| format!("{:<18}", moment.id))
            .collect::<Vec<_>>();
        println!("{}", cells.join(" "));
    }
    Ok(())
}

pub fn map(service: &Service, viewer: Option<(f64, f64)>) -> Result<()> {
    let viewer = viewer
        .map(|(latitude, longitude)| GeoPoint::new(latitude, longitude))
        .transpose()
        .context("invalid viewer position")?;
    let view = service.map(viewer)?;
    for pin in &view.pins {
        println!(
            "{}  {:.6},{:.6}",
            pin.id,
            pin.point.latitude(),
            pin.point.longitude()
        );
    }
    match view.region {
        Some(region) => println!("region: {}", region_label(&region)),
        None => println!("region: none"),
    }
    Ok(())
}

pub fn sweep(service: &Service) -> Result<()> {
    let removed = service.store().sweep()?;
    println!("removed {removed} leftover entr{}", if removed == 1 { "y" } else { "ies" });
    Ok(())
}

pub fn ping_core() -> Result<()> {
    println!("moments_core ping={}", ping());
    println!("moments_core version={}", core_version());
    Ok(())
}

fn location_label(moment: &Moment) -> String {
    match moment.location {
        Some(point) => format!("{:.6},{:.6}", point.latitude(), point.longitude()),
        None => "-".to_string(),
    }
}

fn region_label(region: &MapRegion) -> String {
    format!(
        "center {:.6},{:.6} span {:.4}x{:.4}",
        region.latitude, region.longitude, region.latitude_delta, region.longitude_delta
    )
}

fn preview(description: &str) -> String {
    let single_line = description.replace(['\n', '\r'], " ");
    let mut text = single_line.chars().take(PREVIEW_CHARS).collect::<String>();
    if single_line.chars().count() > PREVIEW_CHARS {
        text.push_str("...");
    }
    text
}

#[cfg(test)]
mod tests {
    use super::preview;

    #[test]
    fn preview_flattens_and_caps_text() {
        assert_eq!(preview("a\nb"), "a b");
        let long = "x".repeat(60);
        assert_eq!(preview(&long).chars().count(), 51);
    }
}
