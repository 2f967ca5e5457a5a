//! Built-in mental-health reference corpus.
//!
//! Ships with the engine so retrieval works out of the box; deployments can
//! load their own material through the same [`crate::rag::ReferenceDocument`]
//! shape.

use crate::rag::{DocumentMetadata, ReferenceDocument};

struct StaticDocument {
    content: &'static str,
    source: &'static str,
    topic: &'static str,
    doc_type: &'static str,
}

const DOCUMENTS: &[StaticDocument] = &[
    StaticDocument {
        content: "Depression is a mood disorder that causes a persistent feeling of sadness and loss of interest.\nIt affects how you feel, think, and behave and can lead to a variety of emotional and physical problems.\nCommon symptoms include persistent sadness, loss of interest in activities once enjoyed, sleep disturbances,\nfatigue, feelings of worthlessness, difficulty concentrating, and thoughts of death or suicide.\nDepression is treatable with therapy, medication, lifestyle changes, or a combination of these approaches.",
        source: "mental_health_guide",
        topic: "depression",
        doc_type: "informational",
    },
    StaticDocument {
        content: "Anxiety disorders involve excessive worry, fear, or nervousness that interferes with daily activities.\nCommon symptoms include restlessness, feeling on edge, fatigue, difficulty concentrating, irritability,\nmuscle tension, and sleep problems. Types of anxiety disorders include generalized anxiety disorder,\npanic disorder, social anxiety disorder, and specific phobias. Treatment options include therapy,\nmedication, stress management techniques, and lifestyle changes.",
        source: "mental_health_guide",
        topic: "anxiety",
        doc_type: "informational",
    },
    StaticDocument {
        content: "Cognitive Behavioral Therapy (CBT) is a type of psychotherapy that helps people identify\nand change negative thinking patterns and behaviors. It focuses on challenging distorted thoughts\nand replacing them with more realistic and positive ones. CBT is highly effective for treating\ndepression, anxiety disorders, PTSD, OCD, and many other mental health conditions. It typically\ninvolves working with a therapist for 12-20 sessions and practicing new skills between sessions.",
        source: "therapy_guide",
        topic: "CBT",
        doc_type: "therapeutic",
    },
    StaticDocument {
        content: "Mindfulness meditation is a practice that involves focusing on the present moment without judgment.\nRegular mindfulness practice can reduce stress, anxiety, and depression symptoms by helping you:\n1. Become more aware of your thoughts without being ruled by them\n2. Respond thoughtfully rather than reacting automatically\n3. Develop a greater sense of calm and balance\n4. Improve concentration and sleep quality\nStart with just 5 minutes daily, focusing on your breath, and gradually increase the duration.",
        source: "coping_strategies",
        topic: "mindfulness",
        doc_type: "self_help",
    },
    StaticDocument {
        content: "These grounding techniques can help during moments of anxiety or overwhelming emotions:\n1. 5-4-3-2-1 Technique: Identify 5 things you can see, 4 things you can touch, 3 things you can hear,\n   2 things you can smell, and 1 thing you can taste.\n2. Deep breathing: Breathe in slowly for 4 counts, hold for 4, exhale for 6.\n3. Body scan: Progressively focus attention from head to toe, noticing sensations without judgment.\n4. Physical grounding: Feel your feet on the ground, press your palms together, or hold a cold or textured object.\n5. Mental categories: Name items within categories (e.g., types of dogs, cities, or foods).",
        source: "coping_strategies",
        topic: "grounding",
        doc_type: "crisis_support",
    },
    StaticDocument {
        content: "Physical activity is a powerful tool for improving mental health. Regular exercise:\n- Releases endorphins and other neurotransmitters that reduce pain and enhance mood\n- Reduces levels of stress hormones like cortisol and adrenaline\n- Improves sleep quality\n- Increases self-confidence and sense of control\n- Provides distraction from worries and negative thoughts\nEven 30 minutes of moderate activity 3-5 times per week can significantly improve symptoms of depression and anxiety.",
        source: "lifestyle_strategies",
        topic: "exercise",
        doc_type: "self_help",
    },
    StaticDocument {
        content: "Creating and maintaining a strong support system is essential for mental health.\nHere are ways to build your support network:\n1. Reach out to trusted friends and family members\n2. Join support groups related to your specific challenges\n3. Consider therapy or counseling for professional support\n4. Connect with community organizations or religious/spiritual groups\n5. Use online communities and forums responsibly\nRemember that seeking help is a sign of strength, not weakness.",
        source: "support_resources",
        topic: "social_support",
        doc_type: "informational",
    },
    StaticDocument {
        content: "Trauma-Informed Care (TIC) is an approach that recognizes the widespread impact of trauma\nand understands potential paths for recovery. It recognizes the signs and symptoms of trauma in clients,\nfamilies, staff, and others. TIC responds by fully integrating knowledge about trauma into policies,\nprocedures, and practices, and seeks to actively resist re-traumatization. The key principles include:\nsafety, trustworthiness and transparency, peer support, collaboration, empowerment, and cultural sensitivity.",
        source: "professional_guide",
        topic: "trauma_informed_care",
        doc_type: "professional",
    },
    StaticDocument {
        content: "If you're experiencing thoughts of suicide, please know that you're not alone and help is available.\nPlease contact a crisis helpline immediately:\n- National Suicide Prevention Lifeline (US): 1-800-273-8255 (Available 24/7)\n- Crisis Text Line: Text HOME to 741741 (US & UK)\n- Samaritans (UK): 116 123\nThese services provide free, confidential support 24/7. You can also go to your nearest emergency room\nor call emergency services (911 in US, 999 in UK).",
        source: "crisis_resources",
        topic: "suicide_prevention",
        doc_type: "crisis_support",
    },
    StaticDocument {
        content: "Setting boundaries is essential for mental health and healthy relationships.\nHealthy boundaries involve:\n1. Knowing your limits (physical, emotional, mental)\n2. Communicating these limits clearly to others\n3. Being consistent with your boundaries\n4. Respecting others' boundaries as well\n5. Understanding that it's okay to say \"no\"\nRemember that setting boundaries isn't selfish—it's necessary for your wellbeing and for developing\nrespectful, balanced relationships.",
        source: "relationship_guide",
        topic: "boundaries",
        doc_type: "self_help",
    },
];

/// The reference corpus the engine loads by default.
pub fn builtin_corpus() -> Vec<ReferenceDocument> {
    DOCUMENTS
        .iter()
        .map(|doc| ReferenceDocument {
            content: doc.content.to_string(),
            metadata: DocumentMetadata {
                source: doc.source.to_string(),
                topic: doc.topic.to_string(),
                doc_type: doc.doc_type.to_string(),
            },
        })
        .collect()
}
