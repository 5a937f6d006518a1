use crate::humanize::humanize_secs;
use insight_analytics::ClusterInsight;

/// Editorial copy for one known topic slug. Clusters classified into a topic
/// without an entry here fall back to [`DEFAULT_COPY`].
struct TopicCopy {
    slug: &'static str,
    problem: &'static str,
    resolution: &'static str,
    preventive: &'static str,
    sample_reply: &'static str,
    refund_note: Option<&'static str>,
}

const DEFAULT_COPY: TopicCopy = TopicCopy {
    slug: "",
    problem: "Customer has a general inquiry or support request that needs assistance.",
    resolution: "1. Acknowledge the customer inquiry\n\
                 2. Gather the necessary order and account details\n\
                 3. Provide the appropriate solution\n\
                 4. Confirm the resolution with the customer\n\
                 5. Follow up if needed",
    preventive: "- Provide clear communication\n\
                 - Set realistic expectations\n\
                 - Follow up proactively\n\
                 - Document all interactions",
    sample_reply: "Thank you for reaching out. I'm here to help you with your inquiry.",
    refund_note: None,
};

const TOPIC_COPY: &[TopicCopy] = &[
    TopicCopy {
        slug: "returns-refunds",
        problem: "Customer is requesting to cancel an order or receive a refund for their \
                  purchase.",
        resolution: "1. Verify order details and current status\n\
                     2. Check refund eligibility based on order state\n\
                     3. Process the cancellation or refund according to policy\n\
                     4. Confirm the action with the customer\n\
                     5. Update the order status in the system",
        preventive: "- Provide clear order confirmation emails\n\
                     - Set realistic delivery expectations\n\
                     - Offer order modification options\n\
                     - Publish a clear refund policy",
        sample_reply: "I understand you'd like to cancel your order. Let me check the current \
                       status and process this for you right away.",
        refund_note: Some(
            "**Note**: Unfulfilled-item refunds require **manager approval** (see internal SOP).",
        ),
    },
    TopicCopy {
        slug: "order-updates",
        problem: "Customer wants to know the current status of an order that has already been \
                  placed.",
        resolution: "1. Check the order status and tracking information\n\
                     2. Verify the shipping address and carrier details\n\
                     3. Provide real-time tracking updates\n\
                     4. Offer alternative solutions if the order is held up\n\
                     5. Follow up until delivery confirmation",
        preventive: "- Send proactive shipping updates\n\
                     - Set realistic delivery timelines\n\
                     - Surface tracking links in confirmation emails",
        sample_reply: "I can see you're waiting for your order. Let me check the current \
                       tracking status and get you an update.",
        refund_note: None,
    },
    TopicCopy {
        slug: "inventory-issues",
        problem: "Customer is asking about an item that is out of stock, backordered, or \
                  otherwise unavailable.",
        resolution: "1. Check current product availability\n\
                     2. Verify restock and lead times with purchasing\n\
                     3. Offer comparable substitutes where possible\n\
                     4. Offer pre-order or notify-on-restock options\n\
                     5. Follow up when availability changes",
        preventive: "- Keep inventory counts current on the storefront\n\
                     - Communicate lead times clearly\n\
                     - Offer alternatives at the point of sale",
        sample_reply: "I can help you check the current status and availability of that \
                       product. Let me look that up for you.",
        refund_note: None,
    },
    TopicCopy {
        slug: "pricing-billing",
        problem: "Customer has a question about pricing, an unexpected charge, or an invoice.",
        resolution: "1. Pull up the order and invoice in question\n\
                     2. Walk through each line item with the customer\n\
                     3. Correct any billing error and issue an adjustment\n\
                     4. Confirm the corrected total with the customer\n\
                     5. Document the adjustment for finance",
        preventive: "- Keep published price lists current\n\
                     - Itemize fees on invoices\n\
                     - Flag price changes to repeat customers ahead of time",
        sample_reply: "I'd be happy to go through that charge with you. Let me pull up your \
                       invoice and check the details.",
        refund_note: None,
    },
    TopicCopy {
        slug: "payment-processing",
        problem: "Customer's payment failed, was declined, or was authorized more than once.",
        resolution: "1. Confirm the payment attempt and its failure reason\n\
                     2. Check for duplicate authorizations\n\
                     3. Release or void stray authorization holds\n\
                     4. Retry the payment with the customer on the line\n\
                     5. Confirm the final charge amount",
        preventive: "- Surface clear decline messages at checkout\n\
                     - Void duplicate authorizations automatically\n\
                     - Support more than one payment method",
        sample_reply: "I'm sorry the payment didn't go through. Let me check what happened and \
                       get this sorted for you.",
        refund_note: None,
    },
    TopicCopy {
        slug: "product-substitutions",
        problem: "Customer wants a substitute or replacement for an item they ordered or \
                  received.",
        resolution: "1. Verify the original order details\n\
                     2. Identify acceptable substitute products\n\
                     3. Confirm the substitution and any price difference\n\
                     4. Arrange return shipping for the original item if needed\n\
                     5. Confirm the resolution with the customer",
        preventive: "- Maintain a substitution table for common items\n\
                     - Ask for substitution preferences at order time\n\
                     - Double-check order accuracy before dispatch",
        sample_reply: "I apologize for the mix-up. Let me help you get the right product. \
                       Could you send me a photo of what you received?",
        refund_note: Some(
            "**Required**: Please photograph the SKU and packaging for verification.",
        ),
    },
    TopicCopy {
        slug: "shipping-delivery",
        problem: "Customer is experiencing delays in shipping and wants to know where their \
                  order is.",
        resolution: "1. Check the order status and tracking information\n\
                     2. Contact the carrier for an updated ETA\n\
                     3. Provide the customer with tracking updates\n\
                     4. Offer expedited replacement if the package is lost\n\
                     5. Follow up until delivery confirmation",
        preventive: "- Use reliable shipping partners\n\
                     - Provide proactive shipping updates\n\
                     - Offer expedited shipping options",
        sample_reply: "I can see you're waiting for your delivery. Let me check the carrier's \
                       latest scan and get you an update.",
        refund_note: None,
    },
    TopicCopy {
        slug: "quality-issues",
        problem: "Customer received an item that is damaged, defective, or below expectations.",
        resolution: "1. Request photos of the damage within 24 hours\n\
                     2. Verify the damage and determine the cause\n\
                     3. Process a replacement or refund\n\
                     4. Arrange return shipping if needed\n\
                     5. Document the incident for quality control",
        preventive: "- Use proper packaging materials\n\
                     - Train staff on careful handling\n\
                     - Track damage reports per carrier and per SKU",
        sample_reply: "I'm sorry to hear about the damage. To help you quickly, could you send \
                       photos of the damage within 24 hours?",
        refund_note: Some(
            "**Important**: Photos of damage must be sent within **24 hours** of delivery or \
             refunds/exchanges cannot be processed.",
        ),
    },
];

fn copy_for(slug: &str) -> &'static TopicCopy {
    TOPIC_COPY
        .iter()
        .find(|copy| copy.slug == slug)
        .unwrap_or(&DEFAULT_COPY)
}

/// Render one cluster's resolution playbook: YAML frontmatter with the
/// cluster's operational stats, then the templated article body.
#[must_use]
pub fn render_playbook(cluster: &ClusterInsight) -> String {
    let stats = &cluster.stats;
    let copy = copy_for(&cluster.slug);
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let median = humanize_secs(stats.median_first_response_secs.round() as u64);

    let tags = cluster
        .common_tags
        .iter()
        .map(|tag| format!("\"{tag}\""))
        .collect::<Vec<_>>()
        .join(", ");
    let queries = cluster
        .sample_queries
        .iter()
        .map(|q| format!("  - \"{}\"", q.replace('"', "'")))
        .collect::<Vec<_>>()
        .join("\n");

    let mut md = String::new();
    md.push_str("---\n");
    md.push_str(&format!("title: \"{}\"\n", cluster.topic));
    md.push_str(&format!(
        "description: \"{} resolution playbook\"\n",
        cluster.topic
    ));
    md.push_str(&format!("ticket_volume: {}\n", stats.ticket_total));
    md.push_str(&format!("ticket_pct: {:.1}\n", stats.ticket_pct));
    md.push_str(&format!("neg_csat_pct: {:.1}\n", stats.neg_csat_pct));
    md.push_str(&format!("refund_pct: {:.1}\n", stats.return_pct));
    md.push_str(&format!("median_first_response: \"{median}\"\n"));
    md.push_str(&format!("tags: [{tags}]\n"));
    md.push_str("sample_queries:\n");
    if !queries.is_empty() {
        md.push_str(&queries);
        md.push('\n');
    }
    md.push_str("---\n\n");

    md.push_str("## At-a-Glance\n\n");
    md.push_str(&format!("**Intent**: {}\n", cluster.topic));
    md.push_str(&format!(
        "**Volume**: {} tickets ({:.1} %)\n",
        stats.ticket_total, stats.ticket_pct
    ));
    md.push_str(&format!(
        "**CSAT risk**: {:.1} % negative\n",
        stats.neg_csat_pct
    ));
    md.push_str(&format!("**Refund impact**: {:.1} %\n\n", stats.return_pct));

    md.push_str(&format!("## Problem\n\n{}\n\n", copy.problem));
    md.push_str(&format!(
        "## Step-by-Step Resolution\n\n{}\n\n",
        copy.resolution
    ));
    md.push_str(&format!("## Preventive Tips\n\n{}\n\n", copy.preventive));
    md.push_str(&format!(
        "## Sample Agent Reply\n\n> Hi {{{{customer_name}}}}, {}\n\n",
        copy.sample_reply
    ));

    md.push_str("## Refund / Exchange Eligibility\n\n");
    md.push_str(
        "Standard refund and exchange policies apply. See the \
         [refund policy](returns-refunds.md) for details.\n",
    );
    if let Some(note) = copy.refund_note {
        md.push_str(&format!("\n{note}\n"));
    }
    md.push('\n');

    md.push_str("## Escalation\n\nEmail **CX Escalations**: internal@boxncase.com\n");

    md
}
