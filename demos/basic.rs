use book_recommender::{CorpusItem, RecommenderConfig, RecommenderService};

fn main() -> book_recommender::Result<()> {
    // artifact lives in a scratch dir for the demo
    let dir = tempfile::tempdir()?;
    let config = RecommenderConfig::default().with_artifact_path(dir.path().join("model.cbor"));

    // build corpus
    let mut books = vec![
        CorpusItem::new(1, "A young wizard battles an ancient dragon to save his village"),
        CorpusItem::new(2, "The dragon hoards gold beneath the mountain while dwarves plot"),
        CorpusItem::new(3, "A knight fights a dragon and wins the hand of a princess"),
        CorpusItem::new(4, "A detective solves a string of murders in Victorian London"),
        CorpusItem::new(5, "Murder on a night train: the detective questions every passenger"),
        CorpusItem::new(6, "No description available").with_title("Dragon Riders of the North"),
    ];

    // fit, persist and load
    let service = RecommenderService::load_or_build(config, &books)?;

    println!("Similar to book 1:\n{}", service.recommend_similar_to_book(1, 3)?);
    println!(
        "Similar to \"a detective investigates a murder\":\n{}",
        service.recommend_similar_to_text("a detective investigates a murder", 2)?
    );

    // corpus changed, refit
    books.push(CorpusItem::new(7, "A detective hunts a murderer across foggy London"));
    let artifact = service.rebuild(&books)?;
    println!("model v{} over {} books", artifact.version, artifact.len());
    println!("Similar to book 7:\n{:#?}", service.recommend_similar_to_book(7, 2)?);
    Ok(())
}
