//! Built-in demo catalog.

use super::Catalog;
use crate::types::{CategoryId as Cat, CompanyId as Co};

pub(super) fn demo_catalog() -> Catalog {
    let builder = Catalog::builder()
        .company(Co::Pfizer, "Pfizer")
        .company(Co::Genentech, "Genentech")
        .company(Co::Gsk, "GSK")
        .company(Co::EliLilly, "Eli Lilly")
        .category(Cat::PancreaticCancer, "Pancreatic Cancer")
        .category(Cat::BreastCancer, "Breast Cancer")
        .category(Cat::Arthritis, "Arthritis")
        .category(Cat::AtrialFibrillation, "Atrial Fibrillation")
        .category(Cat::NonSmallCellLungCancer, "Non-Small Cell Lung Cancer")
        .category(Cat::Psoriasis, "Psoriasis")
        .category(Cat::Type2Diabetes, "Type 2 Diabetes")
        .purchase(Co::Pfizer, [Cat::BreastCancer, Cat::Arthritis])
        .purchase(Co::Genentech, [Cat::PancreaticCancer, Cat::BreastCancer])
        .purchase(Co::Gsk, [Cat::Arthritis])
        .purchase(Co::EliLilly, [Cat::Arthritis, Cat::BreastCancer])
        .ad(
            "ibrance_banner",
            Co::Pfizer,
            [Cat::BreastCancer],
            "https://c8.alamy.com/comp/2T3P0W5/medical-advertising-poster-for-vaseline-products-from-the-victorian-era-2T3P0W5.jpg",
            "IBRANCE®—Advancing care in HR+/HER2- MBC",
        )
        .ad(
            "xeljanz_sidebar",
            Co::Pfizer,
            [Cat::Arthritis],
            "https://i.pinimg.com/736x/1e/0a/ea/1e0aeaef251341f51f3c88a1e180e039.jpg",
            "Relief for Rheumatoid Arthritis Starts Here",
        )
        .ad(
            "krazati_interstitial",
            Co::Genentech,
            [Cat::PancreaticCancer],
            "https://i.pinimg.com/474x/79/e4/68/79e468caf13605df6f1b0f5d617e0b23.jpg",
            "Targeted options for KRAS-mutated PDAC",
        )
        .ad(
            "keytruda_banner",
            Co::Gsk,
            // crossover placement
            [Cat::Arthritis],
            "https://static01.nyt.com/images/2011/06/20/science/21Posters-slide-HCPD/21Posters-slide-HCPD-jumbo.jpg?quality=75&auto=webp&disable=upscale",
            "KEYTRUDA®—Because Every Joint Matters",
        )
        .ad(
            "verzenio_banner",
            Co::EliLilly,
            [Cat::BreastCancer],
            "https://news.cornell.edu/sites/default/files/styles/full_size/public/2020-04/dr._thomas_eclectric_oil_front.jpg?itok=JCBcUBPz",
            "VERZENIO®—Keep Fighting HR+ MBC",
        )
        .physician(
            "dr-amara-okafor",
            "Dr. Amara Okafor",
            "Medical Oncologist",
            "Medical oncologist focused on HR-positive metastatic breast cancer, CDK4/6 inhibitor regimens and endocrine therapy resistance.",
        )
        .physician(
            "dr-lucas-brandt",
            "Dr. Lucas Brandt",
            "Rheumatologist",
            "Rheumatologist treating rheumatoid arthritis and psoriatic arthritis with JAK inhibitors and biologic therapies.",
        )
        .physician(
            "dr-mei-tanaka",
            "Dr. Mei Tanaka",
            "Surgical Oncologist",
            "Hepatobiliary and pancreatic surgeon managing pancreatic ductal adenocarcinoma, including KRAS-mutated tumors.",
        )
        .physician(
            "dr-samuel-reyes",
            "Dr. Samuel Reyes",
            "Cardiologist",
            "Electrophysiologist managing atrial fibrillation, anticoagulation and catheter ablation.",
        )
        .physician(
            "dr-priya-natarajan",
            "Dr. Priya Natarajan",
            "Thoracic Oncologist",
            "Thoracic oncologist treating non-small cell lung cancer with targeted therapy and immunotherapy.",
        )
        .physician(
            "dr-hannah-weiss",
            "Dr. Hannah Weiss",
            "Dermatologist",
            "Dermatologist specializing in moderate-to-severe plaque psoriasis and biologic treatment.",
        )
        .physician(
            "dr-omar-haddad",
            "Dr. Omar Haddad",
            "Endocrinologist",
            "Endocrinologist managing type 2 diabetes, GLP-1 receptor agonists and insulin titration.",
        )
        .sponsored_question(
            "sq-ibrance",
            Co::Pfizer,
            "What are first-line options for HR+/HER2- metastatic breast cancer?",
        )
        .sponsored_question(
            "sq-xeljanz",
            Co::Pfizer,
            "When should a JAK inhibitor be considered for rheumatoid arthritis?",
        )
        .sponsored_question(
            "sq-krazati",
            Co::Genentech,
            "How is KRAS G12C-mutated pancreatic cancer treated?",
        )
        .sponsored_question(
            "sq-keytruda",
            Co::Gsk,
            "What is the current management of refractory inflammatory arthritis?",
        )
        .sponsored_question(
            "sq-verzenio",
            Co::EliLilly,
            "How do CDK4/6 inhibitors compare in early breast cancer?",
        );

    // The seed ids are unique literals; a failure here is a programming error
    // caught by the catalog tests, so fall back to an empty catalog.
    builder.build().unwrap_or_default()
}
