/// One canned example passage, keyed by a fragment of the campaign purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceEntry {
    pub purpose: &'static str,
    pub content: &'static str,
}

/// Example Myanmar copy used to steer tone. Order matters: see [`lookup_reference_in`].
pub const REFERENCE_TABLE: &[ReferenceEntry] = &[
    ReferenceEntry {
        purpose: "Brand Awareness",
        content: "မင်္ဂလာပါ ရှင့်။ ကျွန်မတို့ brand လေးကို မိတ်ဆက်ပေးချင်ပါတယ်။ \
နေ့စဉ်ဘဝမှာ သုံးစွဲရလွယ်ကူပြီး အရည်အသွေးကောင်းတဲ့ ပစ္စည်းတွေကို \
ယုံကြည်စိတ်ချစွာ ရွေးချယ်နိုင်ဖို့ ကျွန်မတို့ အမြဲကြိုးစားနေပါတယ်။ \
ကျွန်မတို့ရဲ့ ခရီးလမ်းမှာ အတူလိုက်ပါခဲ့ဖို့ ဖိတ်ခေါ်ပါရစေ။",
    },
    ReferenceEntry {
        purpose: "Product Launch",
        content: "စောင့်မျှော်နေခဲ့တဲ့ နေ့ရောက်လာပါပြီ။ ကျွန်တော်တို့ရဲ့ product အသစ်လေးဟာ \
ဒီနေ့ကစပြီး ဝယ်ယူလို့ရပါပြီ။ အသုံးပြုသူတွေရဲ့ အကြံပြုချက်တွေကို နားထောင်ပြီး \
ပိုကောင်းအောင် ဖန်တီးထားတာမို့ ပထမဆုံး စမ်းသုံးကြည့်သူတွေထဲမှာ ပါဝင်လိုက်ပါ။",
    },
    ReferenceEntry {
        purpose: "Sales",
        content: "ဒီအပတ်အတွင်းမှာသာ ရရှိနိုင်မယ့် အထူးစျေးနှုန်းလေးနဲ့ ပြန်လာပါပြီ။ \
အရေအတွက် အကန့်အသတ်ရှိတာကြောင့် အမြန်ဆုံး မှာယူထားလိုက်ပါနော်။ \
Page ကို message ပို့ပြီး အလွယ်တကူ မှာယူနိုင်ပါတယ်။",
    },
    ReferenceEntry {
        purpose: "Engagement",
        content: "သူငယ်ချင်းတို့ရေ၊ မနက်ခင်းတိုင်း ဘာနဲ့ စတင်လေ့ရှိကြလဲ။ \
ကော်ဖီတစ်ခွက်လား၊ လမ်းလျှောက်တာလား။ Comment မှာ ဝင်ပြောပြပေးကြပါဦး၊ \
အဖြေအကောင်းဆုံး သုံးယောက်ကို လက်ဆောင်လေးတွေ ပို့ပေးသွားမှာပါ။",
    },
    ReferenceEntry {
        purpose: "Education",
        content: "ဒီနေ့မှာ အသားအရေ ထိန်းသိမ်းနည်း အခြေခံ အဆင့်သုံးဆင့်ကို \
မျှဝေပေးချင်ပါတယ်။ ပထမအဆင့်က သန့်ရှင်းရေး၊ ဒုတိယက အစိုဓာတ်ထိန်းခြင်း၊ \
တတိယကတော့ နေရောင်ကာကွယ်ခြင်း ဖြစ်ပါတယ်။ နေ့စဉ် မပျက်မကွက် လုပ်ဆောင်ကြည့်ပါ။",
    },
    ReferenceEntry {
        purpose: "Event",
        content: "လာမယ့် စနေနေ့မှာ ကျင်းပမယ့် ကျွန်တော်တို့ရဲ့ ပွဲလေးကို \
မိသားစုလိုက် လာရောက်လည်ပတ်ဖို့ ဖိတ်ကြားပါတယ်။ ဂီတ၊ အစားအသောက်နဲ့ \
ဆုမဲကံစမ်းမှုတွေ အများကြီး စောင့်ကြိုနေပါတယ်။",
    },
    ReferenceEntry {
        purpose: "Sales Promotion",
        content: "တစ်ခုဝယ် တစ်ခုလက်ဆောင်! ဒီလကုန်အထိသာ ရရှိမယ့် promotion လေးပါ။ \
ချစ်ရသူ၊ မိသားစုနဲ့ သူငယ်ချင်းတွေအတွက်ပါ တစ်ခါတည်း ဝယ်ယူလိုက်ပါ။",
    },
];

/// Looks up the reference passage for `purpose` in the built-in table.
pub fn lookup_reference(purpose: &str) -> String {
    lookup_reference_in(REFERENCE_TABLE, purpose)
}

/// Scans `table` in order; every entry whose key occurs in `purpose` replaces
/// the running result, so the last matching entry wins. Empty when nothing matches.
pub fn lookup_reference_in(table: &[ReferenceEntry], purpose: &str) -> String {
    let mut reference = String::new();
    for entry in table {
        if purpose.contains(entry.purpose) {
            reference = entry.content.to_string();
        }
    }
    reference
}
