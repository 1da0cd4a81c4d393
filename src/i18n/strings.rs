/// All localized strings the pipeline synthesizes itself.
///
/// Every string here must pass the purity validator for its own language;
/// the fallback and emergency paths rely on that.
#[derive(Debug, Clone)]
pub struct LanguageStrings {
    // ==================== Emergency ====================
    /// Domain-neutral professional placeholder used when nothing else is pure
    pub emergency_generic: &'static str,

    // ==================== Fallback Templates ====================
    /// Opening sentence of a fallback statement
    /// Placeholders: {category}
    pub fallback_intro: &'static str,

    /// Sentence listing the legal notions found in the source
    /// Placeholders: {concepts}
    pub fallback_concepts: &'static str,

    /// Separator between listed notions
    pub concept_separator: &'static str,

    /// Added when the source is long or dense with legal notions
    pub fallback_complex_notice: &'static str,

    /// Closing sentence for professional audiences
    pub fallback_review_notice: &'static str,

    /// Closing sentence for the general public
    pub fallback_public_notice: &'static str,

    /// Statement used when the request carried no usable text
    pub empty_input_notice: &'static str,

    // ==================== Legal Categories ====================
    pub category_civil: &'static str,
    pub category_criminal: &'static str,
    pub category_commercial: &'static str,
    pub category_family: &'static str,
    pub category_administrative: &'static str,
    pub category_labor: &'static str,
    pub category_general: &'static str,
}

// ==================== French Strings ====================

pub const FRENCH_STRINGS: LanguageStrings = LanguageStrings {
    emergency_generic: "Contenu juridique en cours de traduction professionnelle. \
Veuillez consulter votre avocat pour plus de précisions.",

    fallback_intro: "Document juridique relevant {category}.",
    fallback_concepts: "Notions juridiques principales : {concepts}.",
    concept_separator: ", ",
    fallback_complex_notice: "Le texte source présente une structure juridique complexe.",
    fallback_review_notice: "Une traduction intégrale est en cours de vérification par un juriste qualifié.",
    fallback_public_notice: "Pour toute question, veuillez consulter un professionnel du droit.",
    empty_input_notice: "Aucun contenu juridique exploitable n'a été fourni.",

    category_civil: "du droit civil",
    category_criminal: "du droit pénal",
    category_commercial: "du droit commercial",
    category_family: "du droit de la famille",
    category_administrative: "du droit administratif",
    category_labor: "du droit du travail",
    category_general: "du domaine juridique général",
};

// ==================== Arabic Strings ====================

pub const ARABIC_STRINGS: LanguageStrings = LanguageStrings {
    emergency_generic: "محتوى قانوني قيد الترجمة المهنية. يرجى استشارة محاميكم لمزيد من التفاصيل.",

    fallback_intro: "وثيقة قانونية تندرج ضمن {category}.",
    fallback_concepts: "المفاهيم القانونية الرئيسية: {concepts}.",
    concept_separator: "، ",
    fallback_complex_notice: "يتضمن النص المصدر بنية قانونية معقدة.",
    fallback_review_notice: "الترجمة الكاملة قيد المراجعة من طرف مختص قانوني مؤهل.",
    fallback_public_notice: "لأي استفسار، يرجى استشارة مهني في القانون.",
    empty_input_notice: "لم يتم تقديم أي محتوى قانوني قابل للمعالجة.",

    category_civil: "القانون المدني",
    category_criminal: "القانون الجنائي",
    category_commercial: "القانون التجاري",
    category_family: "قانون الأسرة",
    category_administrative: "القانون الإداري",
    category_labor: "قانون الشغل",
    category_general: "المجال القانوني العام",
};
