//! The curated candidate pool.
//!
//! Configuration data, not derived: entries are listed in their curated order,
//! which is also the tie-break order when adjusted scores are equal.

use market_core::{CandidateInstrument, Signal};

pub const CANDIDATE_POOL: [CandidateInstrument; 10] = [
    CandidateInstrument {
        rank: 1,
        display_name: "China Merchants Bank",
        symbol_code: "600036",
        base_score: 92,
        signal: Signal::Buy,
        sector: "Banking",
        fund_flow_label: "+735M",
        rationale: "Leading bank with steady northbound buying; high dividend and defensive profile at only 0.95x book",
        stop_loss_price: 35.80,
        take_profit_price: 44.00,
    },
    CandidateInstrument {
        rank: 2,
        display_name: "Ping An Insurance",
        symbol_code: "601318",
        base_score: 89,
        signal: Signal::Buy,
        sector: "Insurance",
        fund_flow_label: "+469M",
        rationale: "Insurance leader; mutual funds added over 10B and earnings visibility is high",
        stop_loss_price: 48.50,
        take_profit_price: 60.00,
    },
    CandidateInstrument {
        rank: 3,
        display_name: "China Yangtze Power",
        symbol_code: "600900",
        base_score: 87,
        signal: Signal::Buy,
        sector: "Utilities",
        fund_flow_label: "+218M",
        rationale: "Hydropower leader with stable cash flow and heavy institutional ownership",
        stop_loss_price: 26.50,
        take_profit_price: 32.00,
    },
    CandidateInstrument {
        rank: 4,
        display_name: "China Shenhua Energy",
        symbol_code: "601088",
        base_score: 85,
        signal: Signal::Watch,
        sector: "Coal",
        fund_flow_label: "+156M",
        rationale: "High-dividend energy security asset suited to long-term allocation",
        stop_loss_price: 32.00,
        take_profit_price: 40.00,
    },
    CandidateInstrument {
        rank: 5,
        display_name: "China Mobile",
        symbol_code: "600941",
        base_score: 83,
        signal: Signal::Watch,
        sector: "Telecom",
        fund_flow_label: "+124M",
        rationale: "Leading carrier and digital economy infrastructure play",
        stop_loss_price: 95.00,
        take_profit_price: 115.00,
    },
    CandidateInstrument {
        rank: 6,
        display_name: "Midea Group",
        symbol_code: "000333",
        base_score: 82,
        signal: Signal::Buy,
        sector: "Home Appliances",
        fund_flow_label: "+321M",
        rationale: "Appliance leader; overseas business keeps growing while input cost pressure eases",
        stop_loss_price: 58.00,
        take_profit_price: 72.00,
    },
    CandidateInstrument {
        rank: 7,
        display_name: "CATL",
        symbol_code: "300750",
        base_score: 80,
        signal: Signal::Watch,
        sector: "New Energy",
        fund_flow_label: "-85M",
        rationale: "Global battery leader, weighed on near term by price competition",
        stop_loss_price: 200.00,
        take_profit_price: 260.00,
    },
    CandidateInstrument {
        rank: 8,
        display_name: "Kweichow Moutai",
        symbol_code: "600519",
        base_score: 79,
        signal: Signal::Watch,
        sector: "Liquor",
        fund_flow_label: "+208M",
        rationale: "Baijiu leader; wholesale prices stabilising and channel inventory clearing",
        stop_loss_price: 1480.00,
        take_profit_price: 1750.00,
    },
    CandidateInstrument {
        rank: 9,
        display_name: "Zhongji Innolight",
        symbol_code: "300308",
        base_score: 78,
        signal: Signal::Buy,
        sector: "AI Compute",
        fund_flow_label: "+567M",
        rationale: "Optical module leader and core AI compute beneficiary as 800G volumes ramp",
        stop_loss_price: 115.00,
        take_profit_price: 150.00,
    },
    CandidateInstrument {
        rank: 10,
        display_name: "Zijin Mining",
        symbol_code: "601899",
        base_score: 76,
        signal: Signal::Watch,
        sector: "Nonferrous Metals",
        fund_flow_label: "+92M",
        rationale: "Nonferrous metals leader; rate cut expectations support gold",
        stop_loss_price: 11.80,
        take_profit_price: 14.50,
    },
];

/// Look up a pool entry by symbol code
pub fn find_candidate(symbol_code: &str) -> Option<&'static CandidateInstrument> {
    CANDIDATE_POOL.iter().find(|c| c.symbol_code == symbol_code)
}
