use bubblegrid::SheetDecoder;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: {} <sheet.jpg> [total_questions] [out.json]", args[0]);
        std::process::exit(2);
    }

    let bytes = std::fs::read(&args[1])?;
    let total: u32 = match args.get(2) {
        Some(n) => n.parse()?,
        None => bubblegrid::DEFAULT_TOTAL_QUESTIONS,
    };

    let decoder = SheetDecoder::new();
    let answers = match decoder.decode(&bytes, total) {
        Ok(answers) => answers,
        Err(e) if e.is_sheet_not_found() => {
            eprintln!("{e}");
            std::process::exit(1);
        }
        Err(e) => return Err(e.into()),
    };

    let answered = answers.iter().filter(|a| a.selected_answer.is_some()).count();
    println!("Decoded {} questions ({} answered).", answers.len(), answered);

    if let Some(out_path) = args.get(3) {
        let json = serde_json::to_string_pretty(&answers)?;
        std::fs::write(out_path, json)?;
        println!("Wrote {out_path}");
    }
    Ok(())
}
