use ephys_sources::{
    ArrayRecording, ArraySorting, CuratedSorting, PropertyValue, RecordingSource, SortingSource,
};
use ndarray::Array2;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    // Build a small synthetic recording: 4 channels, one second at 20 kHz
    let data = Array2::from_shape_fn((4, 20_000), |(c, f)| {
        ((f as f64) * 0.01 + c as f64).sin() * 50.0
    });
    let mut recording = ArrayRecording::new(data, 20_000.0)?;

    println!("Channels: {}", recording.num_channels());
    println!("Frames: {}", recording.num_frames());
    println!(
        "Duration: {:.3} s",
        recording.frame_to_time(recording.num_frames() as f64)
    );

    // Pull a 10 ms window from two channels
    let window = recording.traces(Some(1_000), Some(1_200), Some(&[0, 2]))?;
    println!("Window shape: {:?}", window.dim());

    // Mark a stimulation epoch and read it back as a windowed view
    recording.add_epoch("stim", 5_000, 9_000)?;
    recording.add_epoch("baseline", 0, 5_000)?;
    println!("Epochs: {:?}", recording.epoch_names());

    let stim = recording.epoch("stim")?;
    println!("Stim epoch frames: {}", stim.num_frames());

    // Waveform snippets around putative spike times; frames near the
    // recording edges come back zero-padded rather than failing
    let snippets = recording.snippets(30, 30, &[-10, 4_000, 19_995], None)?;
    println!("Extracted {} snippets of shape {:?}", snippets.len(), snippets[0].dim());

    // A matching sorting with two units
    let mut sorting = ArraySorting::from_trains(vec![
        (1, vec![1_200, 4_800, 9_100, 15_000]),
        (2, vec![700, 5_300, 12_400]),
    ])?;
    sorting.add_unit_property(1, "quality", PropertyValue::Float(0.92))?;

    for unit in sorting.unit_ids() {
        let spikes_in_stim = sorting.spike_train(unit, Some(5_000), Some(9_000))?;
        println!("Unit {} spikes during stim: {:?}", unit, spikes_in_stim);
    }

    // Curate without touching the original sorting
    let mut curated = CuratedSorting::new(&sorting);
    let merged = curated.merge_units(1, 2)?;
    println!(
        "Merged unit {} has {} spikes",
        merged,
        curated.spike_train(merged, None, None)?.len()
    );

    Ok(())
}
